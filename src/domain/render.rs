//! Rendering of the generated init.sql and .env lines

use crate::domain::entities::{SecretValue, ServiceDescriptor};

/// Header lines of the database container's env file.
pub fn env_header(admin_user: &str, admin_password: &str) -> Vec<String> {
    vec![
        "# Root user for initial setup (used by Docker only)".to_string(),
        format!("POSTGRES_USER={admin_user}"),
        format!("POSTGRES_PASSWORD={admin_password}"),
    ]
}

/// Env lines for one service: blank separator, comment, password variable.
pub fn env_entry(service: &ServiceDescriptor, password: &SecretValue) -> Vec<String> {
    vec![
        String::new(),
        format!("# Database configuration for {} service.", service.name),
        format!("{}={}", service.password_var(), password.value()),
    ]
}

/// SQL lines creating the database and user of one service, followed by a
/// blank separator line.
///
/// The password is embedded in plain text because the postgres entrypoint
/// does not expand variables in `.sql` init scripts.
pub fn sql_block(service: &ServiceDescriptor, password: &SecretValue) -> Vec<String> {
    let db = &service.database;
    let user = &service.user;
    vec![
        format!("-- Create DB and user for {} service", service.name),
        format!("CREATE DATABASE {db};"),
        format!(
            "CREATE USER {user} WITH ENCRYPTED PASSWORD '{}';",
            quote_literal(password.value())
        ),
        format!("GRANT ALL PRIVILEGES ON DATABASE {db} TO {user};"),
        String::new(),
        "-- Grant schema permissions".to_string(),
        format!("\\c {db}"),
        format!("GRANT ALL ON SCHEMA public TO {user};"),
        format!("GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA public TO {user};"),
        format!("GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA public TO {user};"),
        format!("ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL ON TABLES TO {user};"),
        format!("ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL ON SEQUENCES TO {user};"),
        String::new(),
    ]
}

/// Double single quotes for use inside a SQL string literal.
fn quote_literal(s: &str) -> String {
    s.replace('\'', "''")
}
