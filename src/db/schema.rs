// Creation order matters: later tables reference `users`.
pub const TABLES: [(&str, &str); 4] = [
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            username VARCHAR(50) NOT NULL UNIQUE,
            password VARCHAR(255) NOT NULL,
            name VARCHAR(100) NOT NULL,
            email VARCHAR(100) NULL,
            phone VARCHAR(20) NULL,
            role VARCHAR(20) NOT NULL DEFAULT 'employee',
            department VARCHAR(100) NULL,
            position VARCHAR(100) NULL,
            last_login_at DATETIME NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "attendance_records",
        r#"
        CREATE TABLE IF NOT EXISTS attendance_records (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            user_id BIGINT UNSIGNED NOT NULL,
            check_in_time DATETIME NOT NULL,
            check_out_time DATETIME NULL,
            check_in_location VARCHAR(255) NULL,
            check_out_location VARCHAR(255) NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            INDEX idx_attendance_user_id (user_id),
            INDEX idx_attendance_check_in (check_in_time),
            CONSTRAINT fk_attendance_user FOREIGN KEY (user_id)
                REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    ),
    (
        "leave_requests",
        r#"
        CREATE TABLE IF NOT EXISTS leave_requests (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            user_id BIGINT UNSIGNED NOT NULL,
            leave_type VARCHAR(20) NOT NULL,
            start_date DATE NOT NULL,
            end_date DATE NOT NULL,
            days DECIMAL(5,1) NOT NULL,
            reason TEXT NOT NULL,
            status VARCHAR(20) NOT NULL DEFAULT 'pending',
            approver_id BIGINT UNSIGNED NULL,
            remark TEXT NULL,
            decided_at DATETIME NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            INDEX idx_leave_user_id (user_id),
            INDEX idx_leave_status (status),
            CONSTRAINT fk_leave_user FOREIGN KEY (user_id)
                REFERENCES users(id) ON DELETE CASCADE,
            CONSTRAINT fk_leave_approver FOREIGN KEY (approver_id)
                REFERENCES users(id) ON DELETE SET NULL
        )
        "#,
    ),
    (
        "leave_balances",
        r#"
        CREATE TABLE IF NOT EXISTS leave_balances (
            id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY,
            user_id BIGINT UNSIGNED NOT NULL,
            year INT NOT NULL,
            annual_leave DECIMAL(5,1) NOT NULL DEFAULT 0,
            sick_leave DECIMAL(5,1) NOT NULL DEFAULT 0,
            personal_leave DECIMAL(5,1) NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE KEY uq_balance_user_year (user_id, year),
            CONSTRAINT fk_balance_user FOREIGN KEY (user_id)
                REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    ),
];
