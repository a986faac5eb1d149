use rusqlite::{params, Connection, Result};
use uuid::Uuid;

/// Ejecuta todas las migraciones de la base de datos.
///
/// Crea las colecciones del almacén (catálogos, conceptos, gastos,
/// adjuntos, traslados, rendiciones, items y configuración) con sus
/// índices secundarios, e inserta los datos semilla la primera vez.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Catálogos contables
    conn.execute(
        "CREATE TABLE IF NOT EXISTS catalog_cr (
            cr_codigo TEXT PRIMARY KEY,
            cr_nombre TEXT NOT NULL,
            activo INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS catalog_accounts (
            cta_codigo TEXT PRIMARY KEY,
            cta_nombre TEXT NOT NULL,
            activo INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS catalog_partidas (
            partida_codigo TEXT PRIMARY KEY,
            partida_nombre TEXT NOT NULL,
            activo INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    // Conceptos de gasto
    conn.execute(
        "CREATE TABLE IF NOT EXISTS concepts (
            concept_id TEXT PRIMARY KEY,
            nombre TEXT NOT NULL,
            cta_default_codigo TEXT NOT NULL DEFAULT '',
            partida_default_codigo TEXT NOT NULL DEFAULT '',
            clasificacion_default_codigo TEXT NOT NULL DEFAULT '',
            requiere_doc INTEGER NOT NULL DEFAULT 0,
            requiere_respaldo INTEGER NOT NULL DEFAULT 0,
            favorito INTEGER NOT NULL DEFAULT 0,
            activo INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_concepts_activo ON concepts(activo)",
        [],
    )?;

    // Configuración (fila única key='app')
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            responsable_nombre TEXT NOT NULL DEFAULT '',
            responsable_rut TEXT NOT NULL DEFAULT '',
            cargo TEXT NOT NULL DEFAULT '',
            telefono TEXT NOT NULL DEFAULT '',
            empresa TEXT NOT NULL DEFAULT '',
            banco TEXT NOT NULL DEFAULT '',
            tipo_cuenta TEXT NOT NULL DEFAULT '',
            numero_cuenta TEXT NOT NULL DEFAULT '',
            cr_default_codigo TEXT NOT NULL DEFAULT '',
            correlativo_prefix TEXT NOT NULL DEFAULT 'RC',
            correlativo_next_number INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;

    // Gastos y adjuntos
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            gasto_id TEXT PRIMARY KEY,
            fecha TEXT NOT NULL,
            concept_id TEXT NOT NULL,
            monto INTEGER NOT NULL,
            doc_tipo TEXT NOT NULL CHECK(doc_tipo IN ('Boleta', 'Factura', 'Voucher', 'SinDoc')),
            doc_numero TEXT NOT NULL DEFAULT '',
            detalle TEXT NOT NULL DEFAULT '',
            cr_codigo TEXT NOT NULL,
            cta_codigo TEXT NOT NULL,
            partida_codigo TEXT NOT NULL,
            clasificacion_codigo TEXT NOT NULL DEFAULT '',
            estado TEXT NOT NULL CHECK(estado IN ('pendiente', 'rendido')),
            rendicion_id TEXT,
            source TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_estado ON expenses(estado)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_fecha ON expenses(fecha)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_concept ON expenses(concept_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_rendicion ON expenses(rendicion_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attachments (
            adjunto_id TEXT PRIMARY KEY,
            gasto_id TEXT NOT NULL,
            filename TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            blob BLOB NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attachments_gasto ON attachments(gasto_id)",
        [],
    )?;

    // Traslados
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transfers (
            transfer_id TEXT PRIMARY KEY,
            fecha TEXT NOT NULL,
            origen TEXT NOT NULL,
            destino TEXT NOT NULL,
            tipo TEXT NOT NULL,
            cr_codigo TEXT NOT NULL DEFAULT '',
            visita TEXT NOT NULL DEFAULT '',
            notas TEXT NOT NULL DEFAULT '',
            estado TEXT NOT NULL CHECK(estado IN ('pendiente', 'usado')),
            gasto_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transfers_estado ON transfers(estado)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transfers_fecha ON transfers(fecha)",
        [],
    )?;

    // Rendiciones e items
    conn.execute(
        "CREATE TABLE IF NOT EXISTS reimbursements (
            rendicion_id TEXT PRIMARY KEY,
            correlativo TEXT NOT NULL,
            fecha_creacion TEXT NOT NULL,
            estado TEXT NOT NULL CHECK(estado IN ('borrador', 'enviada', 'devuelta', 'aprobada')),
            motivo_devuelta TEXT,
            total INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_reimbursements_estado ON reimbursements(estado)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_reimbursements_fecha ON reimbursements(fecha_creacion)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS reimbursement_items (
            item_id TEXT PRIMARY KEY,
            rendicion_id TEXT NOT NULL,
            gasto_id TEXT NOT NULL,
            orden INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_rendicion ON reimbursement_items(rendicion_id)",
        [],
    )?;

    seed_data(conn)?;

    Ok(())
}

/// Inserta los datos semilla cuando las tablas están vacías.
fn seed_data(conn: &Connection) -> Result<()> {
    // Configuración por defecto
    let settings_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM settings WHERE key = 'app'", [], |row| {
            row.get(0)
        })?;
    if settings_count == 0 {
        conn.execute(
            "INSERT INTO settings (key, correlativo_prefix, correlativo_next_number)
             VALUES ('app', 'RC', 1)",
            [],
        )?;
    }

    // Catálogos de ejemplo
    let cr_count: i64 = conn.query_row("SELECT COUNT(*) FROM catalog_cr", [], |row| row.get(0))?;
    if cr_count == 0 {
        let crs = [("0001", "Gerencia Constructora"), ("0002", "Calidad")];
        for (codigo, nombre) in crs.iter() {
            conn.execute(
                "INSERT INTO catalog_cr (cr_codigo, cr_nombre, activo) VALUES (?1, ?2, 1)",
                [codigo, nombre],
            )?;
        }
    }

    let acct_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM catalog_accounts", [], |row| row.get(0))?;
    if acct_count == 0 {
        let accounts = [("510100", "Gastos de Viaje"), ("510200", "Combustibles")];
        for (codigo, nombre) in accounts.iter() {
            conn.execute(
                "INSERT INTO catalog_accounts (cta_codigo, cta_nombre, activo) VALUES (?1, ?2, 1)",
                [codigo, nombre],
            )?;
        }
    }

    let partida_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM catalog_partidas", [], |row| row.get(0))?;
    if partida_count == 0 {
        let partidas = [("01", "Operación"), ("02", "Administración")];
        for (codigo, nombre) in partidas.iter() {
            conn.execute(
                "INSERT INTO catalog_partidas (partida_codigo, partida_nombre, activo)
                 VALUES (?1, ?2, 1)",
                [codigo, nombre],
            )?;
        }
    }

    // Conceptos frecuentes
    let concept_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM concepts", [], |row| row.get(0))?;
    if concept_count == 0 {
        let concepts = [
            ("Combustible", "510200", "01"),
            ("Estacionamiento", "510100", "01"),
        ];
        for (nombre, cta, partida) in concepts.iter() {
            conn.execute(
                "INSERT INTO concepts (concept_id, nombre, cta_default_codigo,
                     partida_default_codigo, clasificacion_default_codigo,
                     requiere_doc, requiere_respaldo, favorito, activo)
                 VALUES (?1, ?2, ?3, ?4, '', 1, 1, 1, 1)",
                params![Uuid::new_v4().to_string(), nombre, cta, partida],
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_create_schema_and_seed() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let prefix: String = conn
            .query_row(
                "SELECT correlativo_prefix FROM settings WHERE key = 'app'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(prefix, "RC");

        let concepts: i64 = conn
            .query_row("SELECT COUNT(*) FROM concepts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(concepts, 2);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        // los datos semilla no se duplican
        let crs: i64 = conn
            .query_row("SELECT COUNT(*) FROM catalog_cr", [], |row| row.get(0))
            .unwrap();
        assert_eq!(crs, 2);
    }
}
