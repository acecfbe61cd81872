use crate::executor::{shell_quote, CommandExecutor};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff"];

#[allow(async_fn_in_trait)]
pub trait LocateIcon {
    /// 常に何らかのパスを返す（見つからなければバンドル自体）
    async fn locate_icon_resource(&self, bundle: &Path, app_name: &str) -> PathBuf;
}

pub struct IconLocator<E> {
    executor: E,
}

impl<E: CommandExecutor> IconLocator<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Info.plist の CFBundleIconFile（拡張子なしなら .icns を補う）
    async fn declared_icon_file(&self, bundle: &Path) -> Option<String> {
        let info = bundle.join("Contents").join("Info");
        let command = format!(
            "defaults read {} CFBundleIconFile",
            shell_quote(&info.to_string_lossy())
        );
        let name = self.executor.run(&command, None).await.ok()?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if name.to_ascii_lowercase().ends_with(".icns") {
            Some(name.to_string())
        } else {
            Some(format!("{}.icns", name))
        }
    }
}

impl<E: CommandExecutor> LocateIcon for IconLocator<E> {
    async fn locate_icon_resource(&self, bundle: &Path, app_name: &str) -> PathBuf {
        let resources = bundle.join("Contents").join("Resources");

        if let Some(declared) = self.declared_icon_file(bundle).await {
            let path = resources.join(&declared);
            if path.is_file() {
                debug!(app = app_name, path = %path.display(), "宣言済みアイコン");
                return path;
            }
        }

        let found = conventional_icon(&resources, app_name)
            .or_else(|| first_icns(&resources))
            .or_else(|| largest_raster(&resources));

        match found {
            Some(path) => {
                debug!(app = app_name, path = %path.display(), "アイコン素材");
                path
            }
            None => {
                debug!(app = app_name, "アイコン素材なし、バンドルを使用");
                bundle.to_path_buf()
            }
        }
    }
}

fn conventional_icon(resources: &Path, app_name: &str) -> Option<PathBuf> {
    ["AppIcon.icns".to_string(), "Icon.icns".to_string(), format!("{}.icns", app_name)]
        .iter()
        .map(|name| resources.join(name))
        .find(|path| path.is_file())
}

/// Resources 直下のファイル（サブディレクトリは見ない）
fn resource_files(resources: &Path) -> Vec<PathBuf> {
    WalkDir::new(resources)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// 名前順で最初の .icns
fn first_icns(resources: &Path) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = resource_files(resources)
        .into_iter()
        .filter(|path| has_extension(path, &["icns"]))
        .collect();
    files.sort_by_key(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    });
    files.into_iter().next()
}

/// バイト数が最大のラスター画像
fn largest_raster(resources: &Path) -> Option<PathBuf> {
    resource_files(resources)
        .into_iter()
        .filter(|path| has_extension(path, RASTER_EXTENSIONS))
        .filter_map(|path| {
            let size = std::fs::metadata(&path).ok()?.len();
            Some((size, path))
        })
        .max_by(|(a_size, a_path), (b_size, b_path)| {
            // 同じサイズなら名前の若い方
            a_size.cmp(b_size).then_with(|| b_path.cmp(a_path))
        })
        .map(|(_, path)| path)
}
