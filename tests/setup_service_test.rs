//! Tests for SetupService: scan, aggregate, write

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use pgsetup::application::services::{ServiceStatus, SetupService};
use pgsetup::application::ApplicationError;
use pgsetup::config::Settings;
use pgsetup::domain::{DomainError, DATABASE_USER_FIELD};
use pgsetup::infrastructure::traits::RealFileSystem;
use pgsetup::util::testing::{self, create_service_dir, service_config};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn service() -> SetupService {
    SetupService::new(Arc::new(RealFileSystem), Arc::new(Settings::default()))
}

/// Root with services `auth` and `billing` plus an unrelated directory.
#[fixture]
fn two_services() -> TempDir {
    let temp = TempDir::new().unwrap();
    create_service_dir(
        temp.path(),
        "auth",
        Some(&service_config("auth", "auth_db", "auth_user")),
        Some("DB_PASSWORD=pw1\n"),
    );
    create_service_dir(
        temp.path(),
        "billing",
        Some(&service_config("billing", "billing_db", "billing_user")),
        Some("OTHER=1\nDB_PASSWORD=\"pw2\"\n"),
    );
    create_service_dir(temp.path(), "docs", None, None);
    fs::write(temp.path().join("README.md"), "not a service").unwrap();
    temp
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[rstest]
fn given_two_services_when_generating_then_both_files_contain_them(two_services: TempDir) {
    let service = service();

    let setup = service.generate(two_services.path()).unwrap();
    let paths = service.write(two_services.path(), &setup).unwrap();

    let env = read(&paths.env);
    assert!(env.contains("AUTH_DB_PASSWORD=pw1"));
    assert!(env.contains("BILLING_DB_PASSWORD=pw2"));

    let sql = read(&paths.sql);
    assert_eq!(sql.matches("CREATE DATABASE").count(), 2);
    let auth_pos = sql.find("CREATE DATABASE auth_db;").unwrap();
    let billing_pos = sql.find("CREATE DATABASE billing_db;").unwrap();
    assert!(auth_pos < billing_pos, "services must appear in discovery order");
    assert!(sql.contains("CREATE USER billing_user WITH ENCRYPTED PASSWORD 'pw2';"));
}

#[rstest]
fn given_two_services_when_generating_then_env_file_has_exact_layout(two_services: TempDir) {
    let service = service();

    let setup = service.generate(two_services.path()).unwrap();
    let paths = service.write(two_services.path(), &setup).unwrap();

    let expected = "\
# Root user for initial setup (used by Docker only)
POSTGRES_USER=postgres
POSTGRES_PASSWORD=password

# Database configuration for auth service.
AUTH_DB_PASSWORD=pw1

# Database configuration for billing service.
BILLING_DB_PASSWORD=pw2";
    assert_eq!(read(&paths.env), expected);
}

#[rstest]
fn given_two_services_when_generating_then_sql_file_has_exact_layout(two_services: TempDir) {
    let service = service();

    let setup = service.generate(two_services.path()).unwrap();
    let paths = service.write(two_services.path(), &setup).unwrap();

    let expected = "\
-- Create DB and user for auth service
CREATE DATABASE auth_db;
CREATE USER auth_user WITH ENCRYPTED PASSWORD 'pw1';
GRANT ALL PRIVILEGES ON DATABASE auth_db TO auth_user;

-- Grant schema permissions
\\c auth_db
GRANT ALL ON SCHEMA public TO auth_user;
GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA public TO auth_user;
GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA public TO auth_user;
ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL ON TABLES TO auth_user;
ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL ON SEQUENCES TO auth_user;

-- Create DB and user for billing service
CREATE DATABASE billing_db;
CREATE USER billing_user WITH ENCRYPTED PASSWORD 'pw2';
GRANT ALL PRIVILEGES ON DATABASE billing_db TO billing_user;

-- Grant schema permissions
\\c billing_db
GRANT ALL ON SCHEMA public TO billing_user;
GRANT ALL PRIVILEGES ON ALL TABLES IN SCHEMA public TO billing_user;
GRANT ALL PRIVILEGES ON ALL SEQUENCES IN SCHEMA public TO billing_user;
ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL ON TABLES TO billing_user;
ALTER DEFAULT PRIVILEGES IN SCHEMA public GRANT ALL ON SEQUENCES TO billing_user;
";
    assert_eq!(read(&paths.sql), expected);
}

#[rstest]
fn given_directories_without_config_when_generating_then_they_are_ignored(two_services: TempDir) {
    let setup = service().generate(two_services.path()).unwrap();

    let names: Vec<_> = setup.services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["auth", "billing"]);
    assert!(setup.skipped.is_empty());
}

#[rstest]
fn given_incomplete_config_when_generating_then_service_is_skipped(two_services: TempDir) {
    create_service_dir(
        two_services.path(),
        "cache",
        Some("service:\n  name: cache\ndatabase:\n  name: cache_db\n"),
        Some("DB_PASSWORD=pw3\n"),
    );

    let setup = service().generate(two_services.path()).unwrap();

    assert_eq!(setup.services.len(), 2);
    assert_eq!(setup.skipped.len(), 1);
    assert!(setup.skipped[0].dir.ends_with("cache"));
    assert_eq!(setup.skipped[0].fields, vec![DATABASE_USER_FIELD]);
    assert!(!setup.env.render().contains("CACHE_DB_PASSWORD"));
    assert!(!setup.sql.render().contains("cache_db"));
}

#[rstest]
fn given_missing_secret_when_generating_then_aborts_without_writing(two_services: TempDir) {
    create_service_dir(
        two_services.path(),
        "ledger",
        Some(&service_config("ledger", "ledger_db", "ledger_user")),
        None,
    );
    let service = service();

    let err = service.generate(two_services.path()).unwrap_err();

    match err {
        ApplicationError::Domain(DomainError::MissingSecret { key, path }) => {
            assert_eq!(key, "DB_PASSWORD");
            assert!(path.ends_with("ledger/.env"));
        }
        other => panic!("expected MissingSecret, got {other:?}"),
    }
    assert!(!service.output_paths(two_services.path()).dir.exists());
}

#[rstest]
fn given_empty_secret_when_generating_then_aborts(two_services: TempDir) {
    create_service_dir(
        two_services.path(),
        "ledger",
        Some(&service_config("ledger", "ledger_db", "ledger_user")),
        Some("DB_PASSWORD=''\n"),
    );

    let err = service().generate(two_services.path()).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::MissingSecret { .. })
    ));
}

#[rstest]
fn given_malformed_yaml_when_generating_then_fails_with_invalid_config(two_services: TempDir) {
    create_service_dir(
        two_services.path(),
        "broken",
        Some("service: [unclosed\n"),
        Some("DB_PASSWORD=x\n"),
    );

    let err = service().generate(two_services.path()).unwrap_err();

    match err {
        ApplicationError::InvalidConfig { path, .. } => {
            assert!(path.ends_with("broken/config.yaml"))
        }
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[rstest]
fn given_unchanged_inputs_when_generating_twice_then_output_is_identical(two_services: TempDir) {
    let service = service();

    let first = service.generate(two_services.path()).unwrap();
    let paths = service.write(two_services.path(), &first).unwrap();
    let (sql1, env1) = (read(&paths.sql), read(&paths.env));

    let second = service.generate(two_services.path()).unwrap();
    service.write(two_services.path(), &second).unwrap();

    assert_eq!(read(&paths.sql), sql1);
    assert_eq!(read(&paths.env), env1);
}

#[rstest]
fn given_existing_output_dir_when_writing_then_output_dir_is_not_a_service(two_services: TempDir) {
    let service = service();
    let setup = service.generate(two_services.path()).unwrap();
    service.write(two_services.path(), &setup).unwrap();

    // postgres/ now exists next to the services
    let again = service.generate(two_services.path()).unwrap();

    assert_eq!(again.services.len(), 2);
}

#[test]
fn given_no_services_when_generating_then_env_has_only_header() {
    let temp = TempDir::new().unwrap();
    let service = service();

    let setup = service.generate(temp.path()).unwrap();
    let paths = service.write(temp.path(), &setup).unwrap();

    assert_eq!(read(&paths.sql), "");
    assert_eq!(read(&paths.env).lines().count(), 3);
}

#[rstest]
fn given_custom_settings_when_generating_then_they_are_honored(two_services: TempDir) {
    let mut settings = Settings {
        output_dir: "db/init".into(),
        sql_file: "01-services.sql".into(),
        ..Settings::default()
    };
    settings.admin.password = "admin-pw".into();
    let service = SetupService::new(Arc::new(RealFileSystem), Arc::new(settings));

    let setup = service.generate(two_services.path()).unwrap();
    let paths = service.write(two_services.path(), &setup).unwrap();

    assert_eq!(paths.sql, two_services.path().join("db/init/01-services.sql"));
    assert!(paths.sql.exists());
    assert!(read(&paths.env).contains("POSTGRES_PASSWORD=admin-pw"));
}

#[rstest]
fn given_mixed_services_when_listing_then_reports_each_state(two_services: TempDir) {
    create_service_dir(
        two_services.path(),
        "ledger",
        Some(&service_config("ledger", "ledger_db", "ledger_user")),
        None,
    );
    create_service_dir(
        two_services.path(),
        "cache",
        Some("service:\n  name: cache\n"),
        None,
    );

    let statuses = service().list(two_services.path()).unwrap();

    assert_eq!(statuses.len(), 4);
    let ready: Vec<_> = statuses
        .iter()
        .filter_map(|s| match s {
            ServiceStatus::Ready {
                service,
                secret_present,
            } => Some((service.name.as_str(), *secret_present)),
            ServiceStatus::Incomplete(_) => None,
        })
        .collect();
    assert_eq!(
        ready,
        vec![("auth", true), ("billing", true), ("ledger", false)]
    );
    assert!(statuses
        .iter()
        .any(|s| matches!(s, ServiceStatus::Incomplete(m) if m.dir.ends_with("cache"))));
}
