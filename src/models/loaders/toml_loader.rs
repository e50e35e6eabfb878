use crate::error::{AppError, AppResult, FileError};
use crate::models::dataset::DatasetCatalog;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载数据集目录
///
/// 文件格式：
/// ```toml
/// [[datasets]]
/// name = "fundamental6"
/// id = "fundamental6"
/// universe = "TOP3000"
/// description = "公司基本面数据"
/// ```
pub async fn load_dataset_catalog(toml_file_path: &Path) -> AppResult<DatasetCatalog> {
    let path_display = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_display, e))?;

    let mut catalog: DatasetCatalog = toml::from_str(&content).map_err(|e| {
        AppError::File(FileError::TomlParseFailed {
            path: path_display.clone(),
            source: e,
        })
    })?;

    catalog.datasets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(catalog)
}

/// 加载数据集目录：文件存在则使用文件，否则（或解析失败时）使用内置目录
pub async fn load_catalog_or_builtin(folder_or_file: &str) -> DatasetCatalog {
    let path = Path::new(folder_or_file);
    if !path.exists() {
        tracing::debug!("未找到数据集目录文件 {}，使用内置目录", folder_or_file);
        return DatasetCatalog::builtin();
    }

    match load_dataset_catalog(path).await {
        Ok(catalog) if !catalog.is_empty() => {
            tracing::info!("✓ 从 {} 加载了 {} 个数据集", folder_or_file, catalog.datasets.len());
            catalog
        }
        Ok(_) => {
            tracing::warn!("数据集目录 {} 为空，使用内置目录", folder_or_file);
            DatasetCatalog::builtin()
        }
        Err(e) => {
            tracing::warn!("加载数据集目录失败: {}，使用内置目录", e);
            DatasetCatalog::builtin()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_catalog_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.toml");
        std::fs::write(
            &path,
            r#"
[[datasets]]
name = "pv1"
id = "pv1"
universe = "TOP500"

[[datasets]]
name = "analyst4"
id = "analyst4"
universe = "TOP1000"
description = "分析师"
"#,
        )
        .unwrap();

        let catalog = load_dataset_catalog(&path).await.unwrap();
        assert_eq!(catalog.datasets[0].name, "analyst4");
        assert_eq!(catalog.get("pv1").unwrap().universe, "TOP500");
    }

    #[tokio::test]
    async fn test_broken_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datasets.toml");
        std::fs::write(&path, "datasets = 3").unwrap();

        let catalog = load_catalog_or_builtin(path.to_str().unwrap()).await;
        assert_eq!(catalog, DatasetCatalog::builtin());
    }
}
