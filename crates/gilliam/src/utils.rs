//! 表形式の出力

use colored::Colorize;
use std::io::IsTerminal;

/// 表の1列（フィールド名と幅）
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub field: &'static str,
    pub width: usize,
}

pub const fn col(field: &'static str, width: usize) -> Column {
    Column { field, width }
}

/// 1行を整形（最後の列は詰めない）
pub fn format_row<F>(spec: &[Column], value: F) -> String
where
    F: Fn(&str) -> String,
{
    spec.iter()
        .enumerate()
        .map(|(i, column)| {
            let text = value(column.field);
            if i + 1 == spec.len() {
                text
            } else {
                format!("{:<width$}", text, width = column.width)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 見出しの下線
pub fn header_rule(spec: &[Column]) -> String {
    spec.iter()
        .map(|column| "-".repeat(column.width))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 標準出力が端末なら見出しを表示
pub fn print_header(spec: &[Column]) {
    if std::io::stdout().is_terminal() {
        println!("{}", format_row(spec, |field| field.to_string()).bold());
        println!("{}", header_rule(spec).dimmed());
    }
}
