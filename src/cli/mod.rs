//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `laue`: 列出 Laue 群及其对称矩阵
//! - `scan`: 沿倒易空间直线计算漫散射强度
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: laue, scan

pub mod laue;
pub mod scan;

use clap::{Parser, Subcommand, ValueEnum};
use qdiffuse::diffuse::PrincipalAxes;

/// qdiffuse - 对称平均漫散射计算
#[derive(Parser)]
#[command(name = "qdiffuse")]
#[command(version)]
#[command(about = "Symmetry-averaged diffuse X-ray scattering near Bragg reflections", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Show the symmetry matrices of a Laue group
    Laue(laue::LaueArgs),

    /// Evaluate diffuse intensity along a line in reciprocal space
    Scan(scan::ScanArgs),
}

/// 漫散射模型主轴
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum PrincipalAxesArg {
    /// Crystal axes (a, b, c)
    #[default]
    Abc,
    /// Rotated axes (a-b, a+b, c)
    #[value(name = "a-b,a+b,c", alias = "diagonal")]
    Diagonal,
}

impl From<PrincipalAxesArg> for PrincipalAxes {
    fn from(arg: PrincipalAxesArg) -> Self {
        match arg {
            PrincipalAxesArg::Abc => PrincipalAxes::Abc,
            PrincipalAxesArg::Diagonal => PrincipalAxes::AMinusBAPlusBC,
        }
    }
}

impl std::fmt::Display for PrincipalAxesArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrincipalAxesArg::Abc => write!(f, "(a, b, c)"),
            PrincipalAxesArg::Diagonal => write!(f, "(a-b, a+b, c)"),
        }
    }
}

/// 解析逗号分隔的数值列表
pub fn parse_list<T: std::str::FromStr, const N: usize>(input: &str) -> Result<[T; N], String> {
    let parts: Vec<&str> = input.split(',').map(|s| s.trim()).collect();
    if parts.len() != N {
        return Err(format!(
            "Expected {} comma-separated values, got {} in '{}'",
            N,
            parts.len(),
            input
        ));
    }

    let values = parts
        .iter()
        .map(|p| {
            p.parse::<T>()
                .map_err(|_| format!("Invalid number '{}' in '{}'", p, input))
        })
        .collect::<Result<Vec<T>, String>>()?;

    values
        .try_into()
        .map_err(|_| format!("Expected {} values in '{}'", N, input))
}
