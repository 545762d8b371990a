//! CLI commands, one module per subcommand

pub mod clean;
pub mod commit;
pub mod fix_images;
pub mod generate;
pub mod init;
pub mod list;
pub mod publish;
pub mod sync;
