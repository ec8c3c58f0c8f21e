//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `qdiffuse::diffuse`, `qdiffuse::models`, `qdiffuse::utils`
//! - 子模块: laue, scan

pub mod laue;
pub mod scan;

use crate::cli::Commands;
use qdiffuse::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Laue(args) => laue::execute(args),
        Commands::Scan(args) => scan::execute(args),
    }
}
