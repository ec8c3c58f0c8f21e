//! # qdiffuse - 对称平均漫散射计算工具
//!
//! 在晶体倒易空间中计算布拉格反射附近的漫散射强度及其对模型参数的梯度。
//!
//! ## 子命令
//! - `laue` - 列出 Laue 群及其对称矩阵
//! - `scan` - 沿倒易空间直线计算漫散射强度
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   └── commands/   (命令执行逻辑)
//!         └── qdiffuse (核心库: diffuse/, models/, batch/, utils/)
//! ```

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use qdiffuse::utils::output;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
