//! SQLite schema definition.

/// Complete database schema for the pharmacy core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Pharmacies & Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS pharmacies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS medicines (
    id TEXT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    points INTEGER NOT NULL DEFAULT 0 CHECK (points >= 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Stock per pharmacy; quantity can never go negative
CREATE TABLE IF NOT EXISTS medicine_stock (
    pharmacy_id TEXT NOT NULL REFERENCES pharmacies(id),
    medicine_id TEXT NOT NULL REFERENCES medicines(id),
    quantity INTEGER NOT NULL CHECK (quantity >= 0),
    price REAL NOT NULL CHECK (price > 0),
    PRIMARY KEY (pharmacy_id, medicine_id)
);

-- ============================================================================
-- People
-- ============================================================================

CREATE TABLE IF NOT EXISTS employees (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL CHECK (role IN ('pharmacist', 'dermatologist')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS patient_categories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    points INTEGER NOT NULL UNIQUE CHECK (points >= 0),
    discount INTEGER NOT NULL UNIQUE CHECK (discount BETWEEN 0 AND 100),
    color TEXT NOT NULL UNIQUE
);

-- Zero-threshold fallback tier, never updated or deleted
INSERT OR IGNORE INTO patient_categories (id, name, points, discount, color)
VALUES ('default', 'Default category', 0, 0, '#ffffff');

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    num_points INTEGER NOT NULL DEFAULT 0,
    num_penalties INTEGER NOT NULL DEFAULT 0 CHECK (num_penalties >= 0),
    category_id TEXT NOT NULL DEFAULT 'default' REFERENCES patient_categories(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_category ON patients(category_id);

-- ============================================================================
-- Employment Contracts & Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS employment_contracts (
    id TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL REFERENCES employees(id),
    pharmacy_id TEXT NOT NULL REFERENCES pharmacies(id),
    valid_from TEXT NOT NULL,
    valid_to TEXT,                                -- NULL while active
    working_hours TEXT NOT NULL DEFAULT '[]',     -- JSON array of {day, start, end}
    CHECK (valid_to IS NULL OR valid_from <= valid_to)
);

CREATE INDEX IF NOT EXISTS idx_contracts_employee ON employment_contracts(employee_id);
CREATE INDEX IF NOT EXISTS idx_contracts_pharmacy ON employment_contracts(pharmacy_id);

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    contract_id TEXT NOT NULL REFERENCES employment_contracts(id),
    patient_id TEXT REFERENCES patients(id),
    from_time TEXT NOT NULL,
    to_time TEXT NOT NULL,
    price REAL NOT NULL CHECK (price > 0),
    status TEXT NOT NULL DEFAULT 'available'
        CHECK (status IN ('available', 'booked', 'took_place', 'cancelled')),
    report TEXT,
    CHECK (from_time < to_time),
    CHECK (status != 'booked' OR patient_id IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS idx_appointments_contract ON appointments(contract_id, status);
CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);

-- ============================================================================
-- Leave Requests
-- ============================================================================

CREATE TABLE IF NOT EXISTS leave_requests (
    id TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL REFERENCES employees(id),
    from_date TEXT NOT NULL,
    to_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'approved', 'rejected')),
    rejection_reason TEXT,
    created_at TEXT NOT NULL,
    CHECK (from_date <= to_date),
    CHECK ((status = 'rejected') = (rejection_reason IS NOT NULL AND trim(rejection_reason) != ''))
);

CREATE INDEX IF NOT EXISTS idx_leave_employee ON leave_requests(employee_id);
CREATE INDEX IF NOT EXISTS idx_leave_status ON leave_requests(status, from_date);

-- ============================================================================
-- Reservations & Purchases
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicine_reservations (
    id TEXT PRIMARY KEY,
    pharmacy_id TEXT NOT NULL REFERENCES pharmacies(id),
    patient_id TEXT NOT NULL REFERENCES patients(id),
    price REAL NOT NULL,
    reserved_at TEXT NOT NULL,
    deadline TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'reserved'
        CHECK (status IN ('reserved', 'expired', 'issued'))
);

CREATE INDEX IF NOT EXISTS idx_reservations_status ON medicine_reservations(status);
CREATE INDEX IF NOT EXISTS idx_reservations_patient ON medicine_reservations(patient_id);

CREATE TABLE IF NOT EXISTS reservation_items (
    reservation_id TEXT NOT NULL REFERENCES medicine_reservations(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    medicine_id TEXT NOT NULL REFERENCES medicines(id),
    medicine_name TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    price REAL NOT NULL,
    PRIMARY KEY (reservation_id, position)
);

-- Append-only sales log for reporting
CREATE TABLE IF NOT EXISTS medicine_purchases (
    id TEXT PRIMARY KEY,
    pharmacy_id TEXT NOT NULL REFERENCES pharmacies(id),
    medicine_id TEXT NOT NULL REFERENCES medicines(id),
    patient_id TEXT NOT NULL REFERENCES patients(id),
    reservation_id TEXT NOT NULL REFERENCES medicine_reservations(id),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    price REAL NOT NULL,
    purchased_on TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_purchases_pharmacy ON medicine_purchases(pharmacy_id, purchased_on);
CREATE INDEX IF NOT EXISTS idx_purchases_patient ON medicine_purchases(patient_id);

-- ============================================================================
-- System Settings
-- ============================================================================

CREATE TABLE IF NOT EXISTS system_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    dermatologist_appointment_points INTEGER NOT NULL,
    pharmacist_appointment_points INTEGER NOT NULL,
    reservation_horizon_hours INTEGER NOT NULL,
    max_penalties INTEGER NOT NULL
);

INSERT OR IGNORE INTO system_settings (
    id, dermatologist_appointment_points, pharmacist_appointment_points,
    reservation_horizon_hours, max_penalties
) VALUES (1, 3, 2, 48, 3);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_is_reentrant() {
        let conn = setup();
        assert!(conn.execute_batch(SCHEMA).is_ok());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM patient_categories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_negative_stock_rejected() {
        let conn = setup();
        conn.execute("INSERT INTO pharmacies (id, name) VALUES ('p1', 'Benu')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO medicines (id, code, name) VALUES ('m1', 'BRF', 'Brufen')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO medicine_stock (pharmacy_id, medicine_id, quantity, price) VALUES ('p1', 'm1', -1, 10.0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejection_reason_constraint() {
        let conn = setup();
        conn.execute(
            "INSERT INTO employees (id, first_name, last_name, email, role) VALUES ('e1', 'Ana', 'Ilic', 'ana@example.com', 'pharmacist')",
            [],
        )
        .unwrap();

        // Rejected without a reason
        let result = conn.execute(
            "INSERT INTO leave_requests (id, employee_id, from_date, to_date, status, created_at) VALUES ('l1', 'e1', '2021-06-10', '2021-06-12', 'rejected', '2021-06-01 10:00:00')",
            [],
        );
        assert!(result.is_err());

        // Pending with a reason
        let result = conn.execute(
            "INSERT INTO leave_requests (id, employee_id, from_date, to_date, status, rejection_reason, created_at) VALUES ('l2', 'e1', '2021-06-10', '2021-06-12', 'pending', 'nope', '2021-06-01 10:00:00')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO leave_requests (id, employee_id, from_date, to_date, status, rejection_reason, created_at) VALUES ('l3', 'e1', '2021-06-10', '2021-06-12', 'rejected', 'Short staffed', '2021-06-01 10:00:00')",
            [],
        );
        assert!(result.is_ok());
    }
}
