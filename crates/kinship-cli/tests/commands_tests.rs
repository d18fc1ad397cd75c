//! Command handlers driven against a temporary database

use kinship_cli::cli::{
    ApplyArgs, ConfigAction, ConfigArgs, DecideArgs, GenderArg, PersonAction, PersonArgs, RelationsArgs, ResolveArgs,
};
use kinship_cli::commands::{self, Service};
use kinship_cli::config::OutputFormat;
use kinship_cli::{CliError, Command, Config, Formatter};
use kinship_domain::{Origin, PersonId, RelationStatus};

fn open(dir: &tempfile::TempDir) -> Service {
    let mut config = Config::default();
    config.kinship.db_path = dir.path().join("family.db");
    Service::open(&config.kinship).unwrap()
}

fn add(service: &Service, formatter: &Formatter, id: i64, gender: GenderArg) {
    let args = PersonArgs {
        action: PersonAction::Add {
            id,
            gender,
            name: None,
        },
    };
    commands::execute_person(args, service, formatter).unwrap();
}

#[tokio::test]
async fn test_apply_and_accept_through_commands() {
    let dir = tempfile::tempdir().unwrap();
    let service = open(&dir);
    let formatter = Formatter::new(OutputFormat::Quiet, false);
    add(&service, &formatter, 1, GenderArg::Male);
    add(&service, &formatter, 2, GenderArg::Female);

    commands::execute_apply(
        ApplyArgs {
            applicant: 2,
            target: 1,
            chain: "父".to_string(),
            note: None,
        },
        &service,
        &formatter,
    )
    .unwrap();
    let apply = service.pending_applications(PersonId(1)).unwrap().remove(0);

    commands::execute_accept(
        DecideArgs {
            person: 1,
            apply_id: apply.id.0,
            no_wait: false,
        },
        &service,
        &formatter,
    )
    .await
    .unwrap();

    assert_eq!(service.relation_status(PersonId(1), PersonId(2)).unwrap(), RelationStatus::Related);
    let back = service.my_relations(PersonId(1)).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].kinship_term, "女儿");
    assert_eq!(back[0].origin, Origin::Manual);

    commands::execute_relations(
        RelationsArgs {
            person: 2,
            pending: false,
        },
        &service,
        &Formatter::new(OutputFormat::Table, false),
    )
    .unwrap();
}

#[tokio::test]
async fn test_command_errors_surface() {
    let dir = tempfile::tempdir().unwrap();
    let service = open(&dir);
    let formatter = Formatter::new(OutputFormat::Table, false);
    add(&service, &formatter, 1, GenderArg::Male);

    let result = commands::execute_apply(
        ApplyArgs {
            applicant: 1,
            target: 1,
            chain: "父".to_string(),
            note: None,
        },
        &service,
        &formatter,
    );
    assert!(matches!(result, Err(CliError::Service(_))));

    let result = commands::execute_apply(
        ApplyArgs {
            applicant: 1,
            target: 2,
            chain: ",".to_string(),
            note: None,
        },
        &service,
        &formatter,
    );
    assert!(matches!(result, Err(CliError::InvalidInput(_))));
}

#[tokio::test]
async fn test_offline_commands_leave_database_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.kinship.db_path = dir.path().join("family.db");
    let config_path = dir.path().join("config.toml");
    let formatter = Formatter::new(OutputFormat::Quiet, false);

    let resolve = Command::Resolve(ResolveArgs {
        chain: "父,父".to_string(),
        from: GenderArg::Male,
        to: GenderArg::Male,
    });
    commands::execute(resolve, &config, Some(&config_path), &formatter).await.unwrap();

    let show = Command::Config(ConfigArgs {
        action: ConfigAction::Show,
    });
    commands::execute(show, &config, Some(&config_path), &formatter).await.unwrap();
    assert!(!config.kinship.db_path.exists());

    let add = Command::Person(PersonArgs {
        action: PersonAction::Add {
            id: 1,
            gender: GenderArg::Female,
            name: None,
        },
    });
    commands::execute(add, &config, Some(&config_path), &formatter).await.unwrap();
    assert!(config.kinship.db_path.exists());
}
