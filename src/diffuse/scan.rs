//! # 倒易空间直线扫描
//!
//! 在两个分数 Miller 坐标之间等距采样，对每个采样点并行计算漫散射贡献。
//! 每个采样点是一个独立任务；共享输入只读。
//!
//! ## 依赖关系
//! - 被 `commands/scan.rs` 调用
//! - 使用 `diffuse/evaluator.rs` 计算单点贡献
//! - 使用 `batch/runner.rs` 并行执行

use crate::batch::BatchRunner;
use crate::diffuse::evaluator::{DiffuseContribution, DiffuseEvaluator};
use crate::error::{DiffuseError, Result};
use crate::models::{nearest_lattice_point, Vec3};

/// 扫描直线
#[derive(Debug, Clone, Copy)]
pub struct ScanLine {
    pub start: Vec3,
    pub end: Vec3,
    pub steps: usize,
}

impl ScanLine {
    pub fn new(start: Vec3, end: Vec3, steps: usize) -> Result<Self> {
        if steps == 0 {
            return Err(DiffuseError::InvalidArgument(
                "scan needs at least one step".to_string(),
            ));
        }
        Ok(Self { start, end, steps })
    }

    /// 采样点 (t, H)，t ∈ [0, 1]，包含两个端点
    pub fn samples(&self) -> Vec<(f64, Vec3)> {
        if self.steps == 1 {
            return vec![(0.0, self.start)];
        }
        let span = self.end - self.start;
        (0..self.steps)
            .map(|i| {
                let t = i as f64 / (self.steps - 1) as f64;
                (t, self.start + span * t)
            })
            .collect()
    }
}

/// 单个扫描点的结果
#[derive(Debug, Clone, Copy)]
pub struct ScanPoint {
    /// 沿直线的参数
    pub t: f64,
    /// 分数 Miller 坐标
    pub h_vec: Vec3,
    /// 最近格点
    pub h0: [i32; 3],
    pub contribution: DiffuseContribution,
}

/// 并行计算整条扫描线
pub fn run_scan(
    evaluator: &DiffuseEvaluator<'_>,
    line: &ScanLine,
    refine: bool,
    runner: &BatchRunner,
) -> Result<Vec<ScanPoint>> {
    let samples = line.samples();
    runner.run(&samples, "Evaluating diffuse intensity", |&(t, h_vec)| {
        let h0 = nearest_lattice_point(h_vec);
        ScanPoint {
            t,
            h_vec,
            h0,
            contribution: evaluator.evaluate(h_vec, h0, refine),
        }
    })
}

/// 强度最高的 n 个点（强度相同时保持原顺序）
pub fn peak_points(points: &[ScanPoint], n: usize) -> Vec<&ScanPoint> {
    let mut sorted: Vec<&ScanPoint> = points.iter().collect();
    sorted.sort_by(|a, b| {
        b.contribution
            .intensity
            .total_cmp(&a.contribution.intensity)
    });
    sorted.truncate(n);
    sorted
}
