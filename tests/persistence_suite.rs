mod common;

use fintrack::{
    config::{Config, ConfigManager},
    domain::{Money, NewGoal, NewTransaction},
    Session,
};
use chrono::NaiveDate;

use common::{setup_file_session, temp_base};

#[test]
fn data_survives_reopening_the_session() {
    let (session, config_manager) = setup_file_session();
    session.seed_sample_data().expect("seed");
    let goal = session
        .goals()
        .create(NewGoal::new(
            "Emergency fund",
            Money::from_major(3000),
            NaiveDate::from_ymd_opt(2030, 1, 1).expect("date"),
        ))
        .expect("goal");
    session
        .goals()
        .add_progress(goal.id, Money::from_major(250))
        .expect("contribution");
    drop(session);

    let config: Config = config_manager.load().expect("load config");
    let reopened = Session::open(config).expect("reopen");
    assert_eq!(
        reopened.ledger().balance().expect("balance"),
        Money::from_minor(436350)
    );
    assert_eq!(
        reopened.goals().goal(goal.id).expect("goal").current_amount,
        Money::from_major(250)
    );
    assert!(!reopened.ledger().reconcile().expect("reconcile").corrected);
}

#[test]
fn restoring_a_backup_rolls_back_transactions_and_balance() {
    let (session, _) = setup_file_session();
    session
        .ledger()
        .deposit(Money::from_major(100))
        .expect("deposit");
    let backup = session.backup(Some("before spending")).expect("backup");

    session
        .ledger()
        .create(NewTransaction::expense("Concert", Money::from_major(60)))
        .expect("expense");
    assert_eq!(
        session.ledger().balance().expect("balance"),
        Money::from_major(40)
    );

    session.restore_backup(&backup).expect("restore");
    assert_eq!(
        session.ledger().balance().expect("balance"),
        Money::from_major(100)
    );
    assert_eq!(
        session.ledger().list_transactions().expect("list").len(),
        1
    );
    assert_eq!(session.list_backups().expect("list")[0].id, backup.id);
}

#[test]
fn sessions_opened_from_a_base_dir_use_the_stored_config() {
    let base = temp_base();
    let session = Session::open_from(base.clone()).expect("first open");
    assert!(base.join("config").join("config.json").exists());
    assert_eq!(session.config(), &Config::default());
    session
        .ledger()
        .deposit(Money::from_major(50))
        .expect("deposit");
    let original = session.backup_config(Some("defaults")).expect("config backup");
    drop(session);

    let manager = ConfigManager::with_base_dir(base.clone()).expect("manager");
    manager
        .save(&Config {
            transfer_category: "Outgoing".into(),
            ..Config::default()
        })
        .expect("save config");

    let reopened = Session::open_from(base.clone()).expect("reopen");
    assert_eq!(reopened.config().transfer_category, "Outgoing");
    assert_eq!(
        reopened.ledger().balance().expect("balance"),
        Money::from_major(50)
    );
    let change = reopened
        .ledger()
        .transfer("Alice", Money::from_major(5))
        .expect("transfer");
    assert_eq!(change.transaction.category.as_deref(), Some("Outgoing"));

    assert_eq!(reopened.list_config_backups().expect("list"), vec![original.clone()]);
    let restored = reopened.restore_config(&original).expect("restore");
    assert_eq!(restored, Config::default());
    assert_eq!(manager.load().expect("load"), Config::default());
}

#[test]
fn clearing_file_data_keeps_a_backup_of_the_old_state() {
    let (session, _) = setup_file_session();
    session
        .ledger()
        .deposit(Money::from_major(999))
        .expect("deposit");

    session.clear_data().expect("clear");
    assert_eq!(
        session.ledger().balance().expect("balance"),
        Money::from_minor(436350)
    );

    let backups = session.list_backups().expect("list");
    assert_eq!(backups.len(), 1);
    assert!(backups[0].id.ends_with("_before-clear.json"));
    session.restore_backup(&backups[0]).expect("restore");
    assert_eq!(
        session.ledger().balance().expect("balance"),
        Money::from_major(999)
    );
}
