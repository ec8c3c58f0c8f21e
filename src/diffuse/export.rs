//! # 扫描数据导出
//!
//! 导出扫描结果到 CSV 和 XY 格式。
//!
//! ## 支持格式
//! - CSV: t, h, k, l, h0, k0, l0, intensity 以及六个梯度分量
//! - XY: t, intensity 两列，`#` 开头的注释行为表头
//!
//! ## 依赖关系
//! - 被 `commands/scan.rs` 调用
//! - 使用 `diffuse/scan.rs` 的 ScanPoint 结构
//! - 使用 `csv` + `serde` 写入 CSV 文件

use crate::diffuse::scan::ScanPoint;
use crate::error::{DiffuseError, Result};

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xy,
}

impl ExportFormat {
    /// 从文件扩展名推断输出格式
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("xy") | Some("dat") | Some("txt") => ExportFormat::Xy,
            _ => ExportFormat::Csv,
        }
    }
}

/// CSV 行
#[derive(Debug, Serialize)]
struct ScanRecord {
    t: f64,
    h: f64,
    k: f64,
    l: f64,
    h0: i32,
    k0: i32,
    l0: i32,
    intensity: f64,
    d_gamma1: f64,
    d_gamma2: f64,
    d_gamma3: f64,
    d_sigma1: f64,
    d_sigma2: f64,
    d_sigma3: f64,
}

impl From<&ScanPoint> for ScanRecord {
    fn from(p: &ScanPoint) -> Self {
        let g = p.contribution.gradient;
        ScanRecord {
            t: p.t,
            h: p.h_vec[0],
            k: p.h_vec[1],
            l: p.h_vec[2],
            h0: p.h0[0],
            k0: p.h0[1],
            l0: p.h0[2],
            intensity: p.contribution.intensity,
            d_gamma1: g[0],
            d_gamma2: g[1],
            d_gamma3: g[2],
            d_sigma1: g[3],
            d_sigma2: g[4],
            d_sigma3: g[5],
        }
    }
}

/// 按格式写出
pub fn export(points: &[ScanPoint], output_path: &Path, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => to_csv(points, output_path),
        ExportFormat::Xy => to_xy(points, output_path),
    }
}

/// 导出为 CSV 格式
pub fn to_csv(points: &[ScanPoint], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for point in points {
        wtr.serialize(ScanRecord::from(point))?;
    }

    wtr.flush().map_err(|e| DiffuseError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 导出为 XY 格式
pub fn to_xy(points: &[ScanPoint], output_path: &Path) -> Result<()> {
    let write_err = |e: std::io::Error| DiffuseError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    };

    let file = File::create(output_path).map_err(write_err)?;
    let mut out = BufWriter::new(file);

    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        writeln!(
            out,
            "# Diffuse scan: ({:.4}, {:.4}, {:.4}) -> ({:.4}, {:.4}, {:.4})",
            first.h_vec[0], first.h_vec[1], first.h_vec[2], last.h_vec[0], last.h_vec[1], last.h_vec[2]
        )
        .map_err(write_err)?;
    }
    writeln!(out, "# Columns: t (fraction of scan line), diffuse intensity").map_err(write_err)?;
    writeln!(out, "#").map_err(write_err)?;

    for p in points {
        writeln!(out, "{:.6}\t{:.6e}", p.t, p.contribution.intensity).map_err(write_err)?;
    }

    out.flush().map_err(write_err)?;
    Ok(())
}
