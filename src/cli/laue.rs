//! # laue 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/laue.rs`

use super::PrincipalAxesArg;
use clap::Args;

/// laue 子命令参数
#[derive(Args, Debug)]
pub struct LaueArgs {
    /// Laue group number (1-14)
    #[arg(short, long, allow_negative_numbers = true, required_unless_present = "all")]
    pub group: Option<i32>,

    /// List all supported Laue groups
    #[arg(long, default_value_t = false, conflicts_with = "group")]
    pub all: bool,

    /// Principal axes of the diffuse model (reference orientation)
    #[arg(long, value_enum, default_value = "abc")]
    pub principal_axes: PrincipalAxesArg,
}
