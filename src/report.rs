//! 実行結果のサマリー
//!
//! 失敗は種類ごとにまとめ、1種類につき最大 `MAX_EXAMPLES` 件だけ例を表示する。

use crate::batch::{FailedApp, RunReport};
use crate::error::FailureKind;
use indicatif::HumanDuration;
use std::fmt::Write;
use std::time::Duration;

/// 種類ごとに表示する失敗例の上限
pub const MAX_EXAMPLES: usize = 10;

/// 失敗を種類ごとにまとめる（空の種類は含めない）
pub fn group_failures(failed: &[FailedApp]) -> Vec<(FailureKind, Vec<&FailedApp>)> {
    FailureKind::ALL
        .iter()
        .map(|kind| {
            let entries: Vec<&FailedApp> = failed.iter().filter(|f| f.kind == *kind).collect();
            (*kind, entries)
        })
        .filter(|(_, entries)| !entries.is_empty())
        .collect()
}

/// 最終サマリーを組み立てる
pub fn render_summary(report: &RunReport, elapsed: Duration) -> String {
    let result = &report.result;
    let mut out = String::new();

    let _ = writeln!(out, "\n📊 処理結果 ({})", HumanDuration(elapsed));
    let _ = writeln!(out, "  対象: {}件", result.total());
    let _ = writeln!(out, "  更新: {}件", result.updated.len());
    let _ = writeln!(out, "  変更なし: {}件", result.unchanged.len());
    let _ = writeln!(out, "  スキップ: {}件", result.skipped.len());
    let _ = writeln!(out, "  失敗: {}件", result.failed.len());
    let _ = writeln!(out, "  最大同時処理数: {}", result.peak_in_flight);

    if report.changed_fields > 0 {
        let _ = writeln!(out, "✔ データファイルを更新しました（{}フィールド）", report.changed_fields);
    }
    if !report.unapplied.is_empty() {
        let _ = writeln!(
            out,
            "\n⚠ データファイルに反映できなかったアプリ ({}件)",
            report.unapplied.len()
        );
        for name in report.unapplied.iter().take(MAX_EXAMPLES) {
            let _ = writeln!(out, "  - {}", name);
        }
    }

    for (kind, entries) in group_failures(&result.failed) {
        let _ = writeln!(out, "\n⚠ {} ({}件)", kind.label(), entries.len());
        for failed in entries.iter().take(MAX_EXAMPLES) {
            let _ = writeln!(out, "  - {}: {}", failed.record.text, failed.message);
        }
        if entries.len() > MAX_EXAMPLES {
            let _ = writeln!(out, "  ... 他 {}件", entries.len() - MAX_EXAMPLES);
        }
    }

    out
}
