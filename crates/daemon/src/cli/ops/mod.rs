pub mod account;
pub mod daemon;
pub mod files;
pub mod health;
pub mod init;
pub mod reconcile;

pub use account::Account;
pub use daemon::Daemon;
pub use files::Files;
pub use health::Health;
pub use init::Init;
pub use reconcile::Reconcile;

crate::command_enum! {
    (Init, Init),
    (Daemon, Daemon),
    (Health, Health),
    (Reconcile, Reconcile),
    (Account, Account),
    (Files, Files),
}
