use super::MIN_ICON_BYTES;
use crate::error::{FetcherError, Result};
use crate::executor::{shell_quote, CommandExecutor};
use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

#[allow(async_fn_in_trait)]
pub trait ExtractIcon {
    /// `resource` を `size`×`size` の PNG にして `output` に置く
    ///
    /// 失敗し、`resource` がバンドル自体でなければバンドルから再試行する。
    async fn extract_icon(&self, resource: &Path, bundle: &Path, output: &Path, size: u32) -> Result<()>;
}

/// `sips` で変換する抽出器
///
/// 素材がバンドル自体のときは `sips` では変換できないので、
/// `NSWorkspace` からアプリのアイコンを取得する（JXA 経由）。
/// どちらも出力ディレクトリ内の一時ファイルに書き、検証後にリネームで置き換える。
pub struct SipsExtractor<E> {
    executor: E,
    min_bytes: u64,
}

impl<E: CommandExecutor> SipsExtractor<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            min_bytes: MIN_ICON_BYTES,
        }
    }

    pub fn with_min_bytes(mut self, min_bytes: u64) -> Self {
        self.min_bytes = min_bytes;
        self
    }

    async fn convert(&self, source: &Path, bundle: &Path, output_dir: &Path, size: u32) -> Result<NamedTempFile> {
        let staging = tempfile::Builder::new()
            .prefix(".icon-")
            .suffix(".png")
            .tempfile_in(output_dir)?;

        if source == bundle {
            let command = workspace_icon_command(source, staging.path())?;
            self.executor.run(&command, Some("アプリアイコン取得")).await?;
        } else {
            let command = format!(
                "sips -s format png {} --out {} --resampleHeightWidth {} {}",
                shell_quote(&source.to_string_lossy()),
                shell_quote(&staging.path().to_string_lossy()),
                size,
                size
            );
            self.executor.run(&command, Some("sips変換")).await?;
        }

        validate_icon(staging.path(), size, self.min_bytes)?;
        Ok(staging)
    }
}

impl<E: CommandExecutor> ExtractIcon for SipsExtractor<E> {
    async fn extract_icon(&self, resource: &Path, bundle: &Path, output: &Path, size: u32) -> Result<()> {
        let output_dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(output_dir)?;

        let mut sources = vec![resource];
        if resource != bundle {
            sources.push(bundle);
        }

        let mut last_error = None;
        for source in sources {
            match self.convert(source, bundle, output_dir, size).await {
                Ok(staging) => {
                    staging.persist(output).map_err(|e| FetcherError::Io(e.error))?;
                    debug!(source = %source.display(), output = %output.display(), "アイコン保存");
                    return Ok(());
                }
                Err(e) => {
                    debug!(source = %source.display(), error = %e, "アイコン変換失敗");
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(FetcherError::Extraction(format!("{} ({})", output.display(), reason)))
    }
}

/// `NSWorkspace.iconForFile` の画像を PNG で書き出す osascript コマンド
fn workspace_icon_command(bundle: &Path, output: &Path) -> Result<String> {
    // JSON の文字列表記はそのまま JS の文字列リテラルになる
    let bundle = serde_json::to_string(&bundle.to_string_lossy())?;
    let output = serde_json::to_string(&output.to_string_lossy())?;
    let script = format!(
        "ObjC.import('AppKit');\n\
         var bundle = {bundle};\n\
         var out = {output};\n\
         var image = $.NSWorkspace.sharedWorkspace.iconForFile(bundle);\n\
         var rep = $.NSBitmapImageRep.imageRepWithData(image.TIFFRepresentation);\n\
         var png = rep.representationUsingTypeProperties($.NSBitmapImageFileTypePNG, $());\n\
         if (!png.writeToFileAtomically(out, false)) {{ throw new Error('write failed: ' + out); }}"
    );
    Ok(format!("osascript -l JavaScript -e {}", shell_quote(&script)))
}

/// サイズと画像としての妥当性を確認し、寸法が違えば `size`×`size` に揃える
fn validate_icon(path: &Path, size: u32, min_bytes: u64) -> Result<()> {
    let bytes = std::fs::metadata(path)?.len();
    if bytes <= min_bytes {
        return Err(FetcherError::Extraction(format!(
            "出力が小さすぎます: {}バイト",
            bytes
        )));
    }

    let img = image::open(path)
        .map_err(|e| FetcherError::Extraction(format!("画像として読めません: {}", e)))?;

    if img.dimensions() != (size, size) {
        debug!(from = ?img.dimensions(), size, "リサイズ");
        img.resize_exact(size, size, FilterType::Lanczos3)
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| FetcherError::Extraction(format!("PNG書き込み失敗: {}", e)))?;
    }

    Ok(())
}
