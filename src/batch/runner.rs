//! # 并行执行器
//!
//! 对一组互相独立的任务（如倒易空间采样点）并行求值。
//!
//! ## 功能
//! - 基于 rayon 的独立线程池
//! - 结果顺序与输入顺序一致
//! - 进度条显示
//!
//! ## 依赖关系
//! - 被 `diffuse/scan.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{DiffuseError, Result};
use crate::utils::progress;

use indicatif::ProgressBar;
use rayon::prelude::*;

/// 并行执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    /// 是否显示进度条
    show_progress: bool,
}

impl BatchRunner {
    /// 创建新的执行器，`jobs == 0` 时使用全部逻辑 CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self {
            jobs,
            show_progress: true,
        }
    }

    /// 关闭进度条
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 对 `items` 逐项并行求值，返回与输入同序的结果
    pub fn run<T, R, F>(&self, items: &[T], message: &str, processor: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        let pb = if self.show_progress {
            progress::create_progress_bar(items.len() as u64, message)
        } else {
            ProgressBar::hidden()
        };

        // 配置 rayon 线程池
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| DiffuseError::ThreadPool(e.to_string()))?;

        let results: Vec<R> = pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let result = processor(item);
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_preserves_order() {
        let items: Vec<u64> = (0..1000).collect();
        let runner = BatchRunner::new(4).quiet();
        let out = runner.run(&items, "square", |x| x * x).unwrap();
        assert_eq!(out.len(), 1000);
        assert!(out.iter().enumerate().all(|(i, &v)| v == (i * i) as u64));
    }

    #[test]
    fn test_zero_jobs_means_all_cpus() {
        let runner = BatchRunner::new(0);
        assert_eq!(runner.jobs(), num_cpus::get());
        assert_eq!(BatchRunner::new(3).jobs(), 3);
    }

    #[test]
    fn test_empty_input() {
        let runner = BatchRunner::new(2).quiet();
        let out: Vec<f64> = runner.run(&[] as &[f64], "empty", |x| *x).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_result_independent_of_worker_count() {
        let items: Vec<f64> = (0..257).map(|i| i as f64 * 0.37).collect();
        let f = |x: &f64| x.sin() * x.sqrt();
        let one = BatchRunner::new(1).quiet().run(&items, "a", f).unwrap();
        let many = BatchRunner::new(8).quiet().run(&items, "b", f).unwrap();
        assert_eq!(one, many);
    }
}
