use crate::features::attachments;
use crate::features::concepts;
use crate::features::expenses::{self, models::DocTipo, models::Expense, models::ExpenseEstado};
use crate::features::reimbursements::models::{
    Reimbursement, ReimbursementEstado, ReimbursementItem,
};
use crate::features::reimbursements::repository;
use crate::features::settings;
use crate::shared::errors::{AppError, AppResult, ReadinessIssue, ReadinessKind};
use crate::shared::time;
use log::info;
use rusqlite::Connection;
use uuid::Uuid;

/// Verifica que un gasto no esté congelado por su rendición.
///
/// Un gasto rendido se congela mientras su rendición esté enviada o
/// aprobada; vuelve a ser editable solo si la rendición pasa a devuelta.
pub fn ensure_expense_unlocked(conn: &Connection, expense: &Expense) -> AppResult<()> {
    let Some(rendicion_id) = &expense.rendicion_id else {
        return Ok(());
    };
    let reimbursement = repository::find_by_id(conn, rendicion_id)?;
    if reimbursement.estado.is_locked() {
        return Err(AppError::locked(format!(
            "El gasto pertenece a la rendición {} (estado \"{}\") y no se puede modificar.",
            reimbursement.correlativo,
            reimbursement.estado.as_str()
        )));
    }
    Ok(())
}

fn issue_label(expense: &Expense) -> String {
    if expense.detalle.trim().is_empty() {
        "Gasto".to_string()
    } else {
        expense.detalle.clone()
    }
}

/// Revisa si un conjunto de gastos está listo para rendirse.
///
/// Devuelve TODAS las observaciones, no solo la primera: un gasto puede
/// aportar una por documento y otra por respaldo a la vez. Ids que ya no
/// existen se omiten.
pub fn check_export_readiness(
    conn: &Connection,
    gasto_ids: &[String],
) -> AppResult<Vec<ReadinessIssue>> {
    let mut issues = Vec::new();

    for gasto_id in gasto_ids {
        let expense = match expenses::repository::find_by_id(conn, gasto_id) {
            Ok(e) => e,
            Err(AppError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        let concept = concepts::repository::get(conn, &expense.concept_id)?;
        let requiere_doc = concept.as_ref().map(|c| c.requiere_doc).unwrap_or(false);
        let requiere_respaldo = concept
            .as_ref()
            .map(|c| c.requiere_respaldo)
            .unwrap_or(false);

        if requiere_doc
            && (expense.doc_tipo == DocTipo::SinDoc || expense.doc_numero.trim().is_empty())
        {
            issues.push(ReadinessIssue {
                gasto_id: gasto_id.clone(),
                kind: ReadinessKind::Doc,
                message: format!(
                    "Falta documento (tipo/número) en: \"{}\"",
                    issue_label(&expense)
                ),
            });
        }

        if requiere_respaldo
            && attachments::repository::count_for_expense(conn, gasto_id)? == 0
        {
            issues.push(ReadinessIssue {
                gasto_id: gasto_id.clone(),
                kind: ReadinessKind::Respaldo,
                message: format!("Falta respaldo (foto) en: \"{}\"", issue_label(&expense)),
            });
        }
    }

    Ok(issues)
}

/// Crea una rendición en borrador a partir de gastos pendientes.
///
/// Todo-o-nada: si cualquier gasto tiene observaciones no se crea nada y
/// el correlativo no avanza. La escritura completa (rendición, items,
/// gastos marcados, contador) va en una sola transacción. Ids repetidos
/// se colapsan a su primera aparición.
pub fn create_reimbursement(
    conn: &mut Connection,
    gasto_ids: &[String],
) -> AppResult<Reimbursement> {
    let mut unique_ids: Vec<String> = Vec::with_capacity(gasto_ids.len());
    for gasto_id in gasto_ids {
        if !unique_ids.contains(gasto_id) {
            unique_ids.push(gasto_id.clone());
        }
    }
    let gasto_ids = unique_ids;

    if gasto_ids.is_empty() {
        return Err(AppError::validation("Selecciona al menos un gasto."));
    }

    let mut selected = Vec::with_capacity(gasto_ids.len());
    for gasto_id in &gasto_ids {
        let expense = expenses::repository::find_by_id(conn, gasto_id)?;
        if expense.estado != ExpenseEstado::Pendiente {
            return Err(AppError::validation(format!(
                "El gasto \"{}\" ya está incluido en otra rendición.",
                issue_label(&expense)
            )));
        }
        selected.push(expense);
    }

    let issues = check_export_readiness(conn, &gasto_ids)?;
    if !issues.is_empty() {
        return Err(AppError::ExportReadiness(issues));
    }

    let tx = conn.transaction()?;

    let settings = settings::repository::get(&tx)?;
    let correlativo = settings::repository::build_correlativo(
        &settings.correlativo_prefix,
        time::current_year(),
        settings.correlativo_next_number,
    );
    let total: i64 = selected.iter().map(|e| e.monto).sum();
    let now = time::now_rfc3339();

    let reimbursement = Reimbursement {
        rendicion_id: Uuid::new_v4().to_string(),
        correlativo,
        fecha_creacion: now.clone(),
        estado: ReimbursementEstado::Borrador,
        motivo_devuelta: None,
        total,
        updated_at: now,
    };
    repository::insert(&tx, &reimbursement)?;

    for (index, gasto_id) in gasto_ids.iter().enumerate() {
        repository::insert_item(
            &tx,
            &ReimbursementItem {
                item_id: Uuid::new_v4().to_string(),
                rendicion_id: reimbursement.rendicion_id.clone(),
                gasto_id: gasto_id.clone(),
                orden: (index + 1) as i64,
            },
        )?;
    }

    expenses::repository::mark_reimbursed(&tx, &gasto_ids, &reimbursement.rendicion_id)?;

    tx.execute(
        "UPDATE settings SET correlativo_next_number = correlativo_next_number + 1
         WHERE key = 'app'",
        [],
    )?;

    tx.commit()?;

    info!(
        "Rendición {} creada con {} gasto(s), total {}",
        reimbursement.correlativo,
        gasto_ids.len(),
        reimbursement.total
    );
    Ok(reimbursement)
}

/// Envía una rendición a aprobación.
///
/// Válido desde borrador o devuelta. Al enviar se limpia el motivo de
/// devolución anterior.
pub fn submit(conn: &Connection, rendicion_id: &str) -> AppResult<Reimbursement> {
    let reimbursement = repository::find_by_id(conn, rendicion_id)?;
    match reimbursement.estado {
        ReimbursementEstado::Borrador | ReimbursementEstado::Devuelta => {
            repository::set_estado(conn, rendicion_id, ReimbursementEstado::Enviada, None)?;
            info!("Rendición {} enviada", reimbursement.correlativo);
            repository::find_by_id(conn, rendicion_id)
        }
        estado => Err(AppError::invalid_transition(estado.as_str(), "enviar")),
    }
}

/// Marca una rendición enviada como devuelta, registrando el motivo.
///
/// El motivo nuevo reemplaza cualquier motivo anterior.
pub fn return_to_draft(
    conn: &Connection,
    rendicion_id: &str,
    motivo: &str,
) -> AppResult<Reimbursement> {
    let reimbursement = repository::find_by_id(conn, rendicion_id)?;
    match reimbursement.estado {
        ReimbursementEstado::Enviada => {
            repository::set_estado(
                conn,
                rendicion_id,
                ReimbursementEstado::Devuelta,
                Some(motivo),
            )?;
            info!("Rendición {} devuelta", reimbursement.correlativo);
            repository::find_by_id(conn, rendicion_id)
        }
        estado => Err(AppError::invalid_transition(estado.as_str(), "marcar devuelta")),
    }
}

/// Aprueba una rendición enviada. Estado terminal.
pub fn approve(conn: &Connection, rendicion_id: &str) -> AppResult<Reimbursement> {
    let reimbursement = repository::find_by_id(conn, rendicion_id)?;
    match reimbursement.estado {
        ReimbursementEstado::Enviada => {
            repository::set_estado(conn, rendicion_id, ReimbursementEstado::Aprobada, None)?;
            info!("Rendición {} aprobada", reimbursement.correlativo);
            repository::find_by_id(conn, rendicion_id)
        }
        estado => Err(AppError::invalid_transition(estado.as_str(), "aprobar")),
    }
}

/// Cancela una rendición en borrador.
///
/// Los gastos vuelven a pendiente con sus adjuntos intactos; la rendición
/// y sus items se eliminan en una sola transacción. El correlativo ya
/// consumido no se reutiliza.
pub fn cancel_draft(conn: &mut Connection, rendicion_id: &str) -> AppResult<()> {
    let reimbursement = repository::find_by_id(conn, rendicion_id)?;
    if reimbursement.estado != ReimbursementEstado::Borrador {
        return Err(AppError::invalid_transition(
            reimbursement.estado.as_str(),
            "cancelar",
        ));
    }

    let tx = conn.transaction()?;
    expenses::repository::revert_to_pending(&tx, rendicion_id)?;
    repository::delete_items(&tx, rendicion_id)?;
    repository::delete(&tx, rendicion_id)?;
    tx.commit()?;

    info!("Rendición {} cancelada", reimbursement.correlativo);
    Ok(())
}
