//! # scan 命令实现
//!
//! 在合成的结构因子网格上，沿倒易空间直线计算对称平均漫散射强度。
//!
//! ## 流程
//! 1. 晶胞 → A⁻¹
//! 2. Laue 群 + 主轴取向 → 对称矩阵集
//! 3. γ, σ → 模型张量
//! 4. 合成 |F(hkl)| 网格（常数或 Wilson 衰减）
//! 5. 并行扫描，打印最强点，导出 CSV/XY
//!
//! ## 依赖关系
//! - 使用 `cli/scan.rs` 定义的参数
//! - 使用 `qdiffuse::diffuse`, `qdiffuse::models`, `qdiffuse::batch`
//! - 使用 `tabled` 打印结果表格

use crate::cli::scan::{FhklModel, ScanArgs};
use qdiffuse::batch::BatchRunner;
use qdiffuse::diffuse::export::{self, ExportFormat};
use qdiffuse::diffuse::scan::peak_points;
use qdiffuse::diffuse::{
    run_scan, DiffuseEvaluator, LaueGroup, PrincipalAxes, ScanLine, ScanPoint, Stencil,
    SymmetryMatrixSet,
};
use qdiffuse::error::{DiffuseError, Result};
use qdiffuse::models::{
    DiffuseModel, DiffuseParams, HklBounds, Lattice, Mat3, StructureFactorGrid, Vec3,
    GRADIENT_LABELS,
};
use qdiffuse::utils::output;

use std::path::PathBuf;
use tabled::builder::Builder;

/// 解析后的扫描配置，并行阶段只读共享
struct ScanConfig {
    lattice: Lattice,
    group: LaueGroup,
    axes: PrincipalAxes,
    params: DiffuseParams,
    bounds: HklBounds,
    fhkl: FhklModel,
    b_factor: f64,
    stencil: Stencil,
    line: ScanLine,
    refine: bool,
    jobs: usize,
    top: usize,
    output: PathBuf,
    format: ExportFormat,
}

impl ScanConfig {
    fn from_args(args: &ScanArgs) -> Result<Self> {
        if args.hkl_max < 0 {
            return Err(DiffuseError::InvalidRange(format!(
                "--hkl-max must be >= 0, got {}",
                args.hkl_max
            )));
        }
        if !args.b_factor.is_finite() || args.b_factor < 0.0 {
            return Err(DiffuseError::InvalidArgument(format!(
                "--b-factor must be finite and >= 0, got {}",
                args.b_factor
            )));
        }

        let [a, b, c, alpha, beta, gamma] = args.cell;
        Ok(Self {
            lattice: Lattice::from_parameters(a, b, c, alpha, beta, gamma),
            group: LaueGroup::try_from(args.group)?,
            axes: PrincipalAxes::from(args.principal_axes),
            params: DiffuseParams {
                gamma: args.gamma,
                sigma: args.sigma,
            },
            bounds: HklBounds::symmetric(args.hkl_max)?,
            fhkl: args.fhkl,
            b_factor: args.b_factor,
            stencil: Stencil::new(args.stencil)?,
            line: ScanLine::new(Vec3(args.from), Vec3(args.to), args.steps)?,
            refine: args.refine,
            jobs: args.jobs,
            top: args.top,
            output: args.output.clone(),
            format: ExportFormat::from_path(&args.output),
        })
    }
}

/// 执行 scan 命令
pub fn execute(args: ScanArgs) -> Result<()> {
    output::print_header("Diffuse Scattering Scan");

    let config = ScanConfig::from_args(&args)?;

    if config.output.exists() && !args.overwrite {
        output::print_warning(&format!(
            "Output exists, use --overwrite to replace: {}",
            config.output.display()
        ));
        return Ok(());
    }

    // 晶胞
    let a_inv = config.lattice.a_inverse()?;
    let (a, b, c, alpha, beta, gamma) = config.lattice.parameters();
    output::print_info(&format!(
        "Cell: {:.3} {:.3} {:.3} {:.2} {:.2} {:.2} (V = {:.1} Å³)",
        a,
        b,
        c,
        alpha,
        beta,
        gamma,
        config.lattice.volume().abs()
    ));

    // 对称性
    let laue_mats = SymmetryMatrixSet::generate(config.group, &config.axes.reference_matrix());
    output::print_info(&format!(
        "Laue group: {} with {} matrices, principal axes {}",
        config.group,
        laue_mats.len(),
        args.principal_axes
    ));
    if config.group.uses_approximate_hexagonal_axes() {
        output::print_warning("Hexagonal operators use approximate 1/sqrt(2) components");
    }

    // 模型与结构因子
    let model = DiffuseModel::from_params(&config.params)?;
    let grid = synthetic_grid(config.bounds, &a_inv, config.fhkl, config.b_factor)?;
    output::print_info(&format!(
        "Structure factors: {} model on [-{m}, {m}]³ ({} points)",
        config.fhkl,
        grid.values().len(),
        m = args.hkl_max
    ));

    let evaluator = DiffuseEvaluator::new(&grid, &laue_mats, &model, a_inv, config.stencil);
    let runner = BatchRunner::new(config.jobs);
    output::print_info(&format!(
        "Scanning {} points with stencil {:?} on {} threads",
        config.line.steps,
        config.stencil.half_width,
        runner.jobs()
    ));

    let points = run_scan(&evaluator, &config.line, config.refine, &runner)?;

    print_summary(&points, grid.bounds(), &config.stencil);
    print_peak_table(&points, config.top, config.refine);

    export::export(&points, &config.output, config.format)?;

    output::print_success(&format!(
        "Wrote {} points to {}",
        points.len(),
        config.output.display()
    ));
    Ok(())
}

/// 合成 |F(hkl)| 网格
///
/// Wilson 模型: |F| = exp(-B·|A⁻¹H|²/4)
pub fn synthetic_grid(
    bounds: HklBounds,
    a_inv: &Mat3,
    model: FhklModel,
    b_factor: f64,
) -> Result<StructureFactorGrid> {
    match model {
        FhklModel::Constant => StructureFactorGrid::from_fn(bounds, |_| 1.0),
        FhklModel::Wilson => StructureFactorGrid::from_fn(bounds, |hkl| {
            let q = *a_inv * Vec3::from_hkl(hkl);
            (-b_factor * q.dot(&q) / 4.0).exp()
        }),
    }
}

fn print_summary(points: &[ScanPoint], bounds: &HklBounds, stencil: &Stencil) {
    let outside = points
        .iter()
        .filter(|p| !bounds.contains_window(p.h0, stencil.half_width))
        .count();
    let total: f64 = points.iter().map(|p| p.contribution.intensity).sum();
    let max = points
        .iter()
        .map(|p| p.contribution.intensity)
        .fold(0.0_f64, f64::max);

    output::print_separator();
    output::print_info(&format!("Max intensity: {:.6e}", max));
    output::print_info(&format!("Summed intensity: {:.6e}", total));
    if outside > 0 {
        output::print_warning(&format!(
            "{} points have a stencil window outside the grid and contribute zero",
            outside
        ));
    }
}

fn print_peak_table(points: &[ScanPoint], top: usize, refine: bool) {
    if top == 0 || points.is_empty() {
        return;
    }

    let mut builder = Builder::default();
    let mut header = vec![
        "t".to_string(),
        "H".to_string(),
        "H0".to_string(),
        "Intensity".to_string(),
    ];
    if refine {
        header.extend(GRADIENT_LABELS.iter().map(|s| s.to_string()));
    }
    builder.push_record(header);

    for p in peak_points(points, top) {
        let h = p.h_vec;
        let mut row = vec![
            format!("{:.4}", p.t),
            format!("({:.3}, {:.3}, {:.3})", h[0], h[1], h[2]),
            format!("({}, {}, {})", p.h0[0], p.h0[1], p.h0[2]),
            format!("{:.4e}", p.contribution.intensity),
        ];
        if refine {
            row.extend(p.contribution.gradient.iter().map(|g| format!("{:.3e}", g)));
        }
        builder.push_record(row);
    }

    let table = builder.build();

    output::print_header(&format!("Top {} points", top.min(points.len())));
    println!("{}", table);
}
