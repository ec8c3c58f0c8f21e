//! # laue 命令实现
//!
//! 打印 Laue 群的对称矩阵（已右乘参考取向），或列出全部 14 个群。
//!
//! ## 依赖关系
//! - 使用 `cli/laue.rs` 定义的参数
//! - 使用 `qdiffuse::diffuse::laue`
//! - 使用 `tabled` 打印表格

use crate::cli::laue::LaueArgs;
use qdiffuse::diffuse::{LaueGroup, PrincipalAxes, SymmetryMatrixSet};
use qdiffuse::error::Result;
use qdiffuse::models::Mat3;
use qdiffuse::utils::output;

use tabled::{Table, Tabled};

/// 执行 laue 命令
pub fn execute(args: LaueArgs) -> Result<()> {
    if args.all {
        print_group_list();
        return Ok(());
    }

    // clap 保证 --all 与 --group 二选一
    let num = args.group.unwrap_or_default();
    let group = LaueGroup::try_from(num)?;
    let axes = PrincipalAxes::from(args.principal_axes);

    output::print_header(&format!("Laue group {}", group));
    output::print_info(&format!("Principal axes: {}", args.principal_axes));

    let set = SymmetryMatrixSet::generate(group, &axes.reference_matrix());
    print_matrix_table(group, &set);

    if group.uses_approximate_hexagonal_axes() {
        output::print_warning(
            "Trigonal/hexagonal operators use 1/sqrt(2) for the 60° rotation components; \
             these matrices are not orthogonal",
        );
    }

    output::print_success(&format!("{} symmetry matrices", set.len()));
    Ok(())
}

/// 列出全部 Laue 群
fn print_group_list() {
    #[derive(Tabled)]
    struct GroupRow {
        #[tabled(rename = "#")]
        number: i32,
        #[tabled(rename = "Symbol")]
        symbol: &'static str,
        #[tabled(rename = "Matrices")]
        count: usize,
        #[tabled(rename = "Axes")]
        axes: &'static str,
    }

    let rows: Vec<GroupRow> = LaueGroup::all()
        .iter()
        .map(|&g| GroupRow {
            number: g.number(),
            symbol: g.symbol(),
            count: g.num_mats(),
            axes: if g.uses_approximate_hexagonal_axes() {
                "approximate"
            } else {
                "exact"
            },
        })
        .collect();

    output::print_header("Supported Laue groups");
    println!("{}", Table::new(&rows));
}

/// 打印对称矩阵表格
fn print_matrix_table(group: LaueGroup, set: &SymmetryMatrixSet) {
    #[derive(Tabled)]
    struct MatrixRow {
        #[tabled(rename = "i")]
        index: usize,
        #[tabled(rename = "Operator")]
        label: &'static str,
        #[tabled(rename = "Matrix")]
        matrix: String,
        #[tabled(rename = "det")]
        det: String,
        #[tabled(rename = "|MᵀM - I|")]
        residual: String,
    }

    let rows: Vec<MatrixRow> = group
        .operations()
        .iter()
        .zip(set.iter())
        .enumerate()
        .map(|(i, (op, m))| MatrixRow {
            index: i,
            label: op.label,
            matrix: format_matrix(m),
            det: format!("{:.4}", m.determinant()),
            residual: format!("{:.2e}", m.orthogonality_residual()),
        })
        .collect();

    println!("{}", Table::new(&rows));
}

/// 三行矩阵文本
fn format_matrix(m: &Mat3) -> String {
    (0..3)
        .map(|i| {
            let r = m.row(i);
            format!("{:>7.4} {:>7.4} {:>7.4}", r[0], r[1], r[2])
        })
        .collect::<Vec<_>>()
        .join("\n")
}
