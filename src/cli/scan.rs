//! # scan 子命令 CLI 定义
//!
//! 沿倒易空间直线计算漫散射强度（以及可选的参数梯度）。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/scan.rs`

use super::{parse_list, PrincipalAxesArg};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 合成结构因子模型
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum FhklModel {
    /// |F| = 1 everywhere
    #[default]
    Constant,
    /// |F| = exp(-B·|q|²/4)
    Wilson,
}

impl std::fmt::Display for FhklModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FhklModel::Constant => write!(f, "constant"),
            FhklModel::Wilson => write!(f, "wilson"),
        }
    }
}

fn parse_triplet(input: &str) -> Result<[f64; 3], String> {
    parse_list(input)
}

fn parse_stencil(input: &str) -> Result<[i32; 3], String> {
    let dhh: [i32; 3] = parse_list(input)?;
    if dhh.iter().any(|&w| w < 0) {
        return Err(format!("Stencil half widths must be >= 0, got '{}'", input));
    }
    Ok(dhh)
}

fn parse_cell(input: &str) -> Result<[f64; 6], String> {
    let cell: [f64; 6] = parse_list(input)?;
    if cell[..3].iter().any(|&x| x <= 0.0) {
        return Err(format!("Cell lengths must be positive, got '{}'", input));
    }
    if cell[3..].iter().any(|&x| x <= 0.0 || x >= 180.0) {
        return Err(format!("Cell angles must lie in (0, 180), got '{}'", input));
    }
    Ok(cell)
}

/// scan 子命令参数
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Unit cell "a,b,c,alpha,beta,gamma" (Å, degrees)
    #[arg(long, value_parser = parse_cell, default_value = "79.1,79.1,38.4,90,90,90")]
    pub cell: [f64; 6],

    /// Laue group number (1-14)
    #[arg(short, long, allow_negative_numbers = true, default_value_t = 7)]
    pub group: i32,

    /// Correlation lengths "g1,g2,g3" (Å)
    #[arg(long, value_parser = parse_triplet, default_value = "50,50,50")]
    pub gamma: [f64; 3],

    /// Displacement amplitudes "s1,s2,s3" (Å)
    #[arg(long, value_parser = parse_triplet, default_value = "0.4,0.4,0.4")]
    pub sigma: [f64; 3],

    /// Scan start "h,k,l" (fractional Miller indices)
    #[arg(long, value_parser = parse_triplet, allow_hyphen_values = true)]
    pub from: [f64; 3],

    /// Scan end "h,k,l" (fractional Miller indices)
    #[arg(long, value_parser = parse_triplet, allow_hyphen_values = true)]
    pub to: [f64; 3],

    /// Number of sample points along the line (inclusive of both ends)
    #[arg(long, default_value_t = 200)]
    pub steps: usize,

    /// Stencil half widths "dh,dk,dl"
    #[arg(long, value_parser = parse_stencil, default_value = "1,1,1")]
    pub stencil: [i32; 3],

    /// Synthetic structure factor grid covers [-M, M] on each axis
    #[arg(long, default_value_t = 30)]
    pub hkl_max: i32,

    /// Synthetic structure factor model
    #[arg(long, value_enum, default_value = "constant")]
    pub fhkl: FhklModel,

    /// B factor for the Wilson model (Å²)
    #[arg(long, default_value_t = 20.0)]
    pub b_factor: f64,

    /// Principal axes of the diffuse model (reference orientation)
    #[arg(long, value_enum, default_value = "abc")]
    pub principal_axes: PrincipalAxesArg,

    /// Also compute gradients with respect to gamma and sigma
    #[arg(long, default_value_t = false)]
    pub refine: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, env = "QDIFFUSE_JOBS", default_value_t = 0)]
    pub jobs: usize,

    /// Number of strongest points to print
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Output file (.csv, or .xy/.dat/.txt for two-column data)
    #[arg(short, long, default_value = "diffuse_scan.csv")]
    pub output: PathBuf,

    /// Overwrite existing output file
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        assert_eq!(
            parse_cell("10,11,12,90,100,90").unwrap(),
            [10.0, 11.0, 12.0, 90.0, 100.0, 90.0]
        );
        assert!(parse_cell("10,11,12,90,90").is_err());
        assert!(parse_cell("10,-11,12,90,90,90").is_err());
        assert!(parse_cell("10,11,12,90,180,90").is_err());
    }

    #[test]
    fn test_parse_stencil() {
        assert_eq!(parse_stencil("0,1,2").unwrap(), [0, 1, 2]);
        assert!(parse_stencil("1,-1,0").is_err());
    }

    #[test]
    fn test_parse_triplet_negative() {
        assert_eq!(parse_triplet("-1.5,0,2").unwrap(), [-1.5, 0.0, 2.0]);
    }
}
