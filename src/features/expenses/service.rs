use crate::features::concepts;
use crate::features::expenses::models::{
    DocTipo, Expense, ExpenseEstado, ExpenseInput, ExpenseSource,
};
use crate::features::expenses::repository;
use crate::features::reimbursements;
use crate::features::transfers;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::time;
use log::debug;
use rusqlite::Connection;
use uuid::Uuid;

/// Valida las selecciones obligatorias de un gasto.
///
/// Reporta la primera categoría faltante, con los mismos mensajes que la
/// pantalla de origen. No persiste nada si falla.
fn validate(conn: &Connection, input: &ExpenseInput) -> AppResult<()> {
    if input.concept_id.trim().is_empty() {
        return Err(AppError::validation("Selecciona un concepto."));
    }
    if input.cr_codigo.trim().is_empty() {
        return Err(AppError::validation(
            "Selecciona Centro de Responsabilidad (CR).",
        ));
    }
    if input.cta_codigo.trim().is_empty() {
        return Err(AppError::validation("Selecciona Cuenta Contable."));
    }
    if input.partida_codigo.trim().is_empty() {
        return Err(AppError::validation(
            "Selecciona Partida (o define default para el concepto).",
        ));
    }
    if input.monto <= 0 {
        return Err(AppError::validation("Ingresa un monto válido."));
    }

    let concept = concepts::repository::get(conn, &input.concept_id)?
        .ok_or_else(|| AppError::validation("Selecciona un concepto."))?;

    if concept.requiere_doc
        && (input.doc_tipo == DocTipo::SinDoc || input.doc_numero.trim().is_empty())
    {
        return Err(AppError::validation(
            "Este concepto requiere documento (tipo y número).",
        ));
    }

    Ok(())
}

/// Completa los códigos vacíos con los defaults del concepto.
fn apply_concept_defaults(conn: &Connection, input: &mut ExpenseInput) -> AppResult<()> {
    if let Some(concept) = concepts::repository::get(conn, &input.concept_id)? {
        if input.cta_codigo.trim().is_empty() {
            input.cta_codigo = concept.cta_default_codigo;
        }
        if input.partida_codigo.trim().is_empty() {
            input.partida_codigo = concept.partida_default_codigo;
        }
        if input.clasificacion_codigo.trim().is_empty() {
            input.clasificacion_codigo = concept.clasificacion_default_codigo;
        }
        if input.detalle.trim().is_empty() {
            input.detalle = concept.nombre;
        }
    }
    Ok(())
}

/// Crea un gasto en estado pendiente.
///
/// Si el gasto proviene de traslados, estos quedan marcados como usados
/// y vinculados al gasto recién creado; inserción y vínculo van en una
/// sola transacción.
pub fn create_expense(conn: &mut Connection, mut input: ExpenseInput) -> AppResult<Expense> {
    apply_concept_defaults(conn, &mut input)?;
    validate(conn, &input)?;

    let now = time::now_rfc3339();
    let expense = Expense {
        gasto_id: Uuid::new_v4().to_string(),
        fecha: input.fecha,
        concept_id: input.concept_id,
        monto: input.monto,
        doc_tipo: input.doc_tipo,
        doc_numero: input.doc_numero.trim().to_string(),
        detalle: input.detalle.trim().to_string(),
        cr_codigo: input.cr_codigo,
        cta_codigo: input.cta_codigo,
        partida_codigo: input.partida_codigo,
        clasificacion_codigo: input.clasificacion_codigo.trim().to_string(),
        estado: ExpenseEstado::Pendiente,
        rendicion_id: None,
        source: input.source,
        created_at: now.clone(),
        updated_at: now,
    };

    let tx = conn.transaction()?;
    repository::insert(&tx, &expense)?;
    if let Some(ExpenseSource::Transfers { transfer_ids }) = &expense.source {
        transfers::repository::mark_used(&tx, transfer_ids, &expense.gasto_id)?;
    }
    tx.commit()?;

    debug!("Gasto creado: {} (${})", expense.gasto_id, expense.monto);
    Ok(expense)
}

/// Actualiza un gasto existente.
///
/// Rechaza la mutación con `Locked` cuando la rendición dueña está
/// enviada o aprobada.
pub fn update_expense(
    conn: &Connection,
    gasto_id: &str,
    mut input: ExpenseInput,
) -> AppResult<Expense> {
    let existing = repository::find_by_id(conn, gasto_id)?;

    reimbursements::service::ensure_expense_unlocked(conn, &existing)?;

    apply_concept_defaults(conn, &mut input)?;
    validate(conn, &input)?;

    repository::update_fields(conn, gasto_id, &input)?;
    repository::find_by_id(conn, gasto_id)
}
