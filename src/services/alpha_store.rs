//! 合格 Alpha 存储 - 业务能力层
//!
//! 只负责"保存 / 读取合格 Alpha"能力，不关心流程

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AlphaDetail, JobOutcome};
use crate::utils::write_atomic;

/// 合格 Alpha 存储
///
/// - `alpha_ids.txt`：每行一个 Alpha ID，只追加
/// - `alpha_details.json`：详细记录数组，每个合格结果追加一项
pub struct AlphaStore {
    ids_path: PathBuf,
    details_path: PathBuf,
}

impl AlphaStore {
    pub fn new(ids_path: impl Into<PathBuf>, details_path: impl Into<PathBuf>) -> Self {
        Self {
            ids_path: ids_path.into(),
            details_path: details_path.into(),
        }
    }

    pub fn ids_path(&self) -> &Path {
        &self.ids_path
    }

    /// 保存合格结果：追加 ID，追加详细记录
    pub fn save(&self, outcome: &JobOutcome) -> AppResult<()> {
        self.append_id(&outcome.alpha_id)?;

        let mut details = self.load_details();
        details.push(AlphaDetail::from(outcome));
        let contents = serde_json::to_string_pretty(&details)?;
        write_atomic(&self.details_path, contents.as_bytes()).map_err(|e| {
            AppError::file_write_failed(self.details_path.display().to_string(), e)
        })?;

        info!("💾 已保存Alpha详细信息: {}", outcome.alpha_id);
        Ok(())
    }

    fn append_id(&self, alpha_id: &str) -> AppResult<()> {
        let path_display = self.ids_path.display().to_string();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.ids_path)
            .map_err(|e| AppError::file_write_failed(&path_display, e))?;

        file.write_all(format!("{}\n", alpha_id).as_bytes())
            .map_err(|e| AppError::file_write_failed(&path_display, e))?;

        debug!("追加 Alpha ID: {}", alpha_id);
        Ok(())
    }

    /// 读取详细记录；文件不存在或损坏时返回空数组
    pub fn load_details(&self) -> Vec<AlphaDetail> {
        if !self.details_path.exists() {
            return Vec::new();
        }

        let parsed = std::fs::read_to_string(&self.details_path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(details) => details,
            Err(e) => {
                warn!(
                    "⚠️ 无法读取 {}: {}，将重新开始记录",
                    self.details_path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// 读取已保存的 Alpha ID（忽略空行）
    pub fn load_ids(&self) -> AppResult<Vec<String>> {
        if !self.ids_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.ids_path)
            .map_err(|e| AppError::file_read_failed(self.ids_path.display().to_string(), e))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// 从 ID 文件中移除已成功提交的 ID，其余按原顺序保留
    pub fn remove_ids(&self, submitted: &[String]) -> AppResult<usize> {
        let remaining: Vec<String> = self
            .load_ids()?
            .into_iter()
            .filter(|id| !submitted.contains(id))
            .collect();

        let contents: String = remaining.iter().map(|id| format!("{}\n", id)).collect();
        write_atomic(&self.ids_path, contents.as_bytes())
            .map_err(|e| AppError::file_write_failed(self.ids_path.display().to_string(), e))?;

        Ok(remaining.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, IsMetrics};
    use serde_json::json;

    fn outcome(alpha_id: &str) -> JobOutcome {
        JobOutcome {
            expression: "rank(eps)".to_string(),
            alpha_id: alpha_id.to_string(),
            passed_all_checks: true,
            metrics: IsMetrics {
                sharpe: 2.1,
                ..Default::default()
            },
            parameters: json!({"universe": "TOP1000"}),
            expression_type: Category::Momentum,
            timestamp: "2026-10-19T10:00:00".to_string(),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> AlphaStore {
        AlphaStore::new(
            dir.path().join("alpha_ids.txt"),
            dir.path().join("alpha_details.json"),
        )
    }

    #[test]
    fn test_save_appends_id_and_detail() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.save(&outcome("a1")).unwrap();
        store.save(&outcome("a2")).unwrap();

        assert_eq!(store.load_ids().unwrap(), vec!["a1", "a2"]);
        let details = store.load_details();
        assert_eq!(details.len(), 2);
        assert_eq!(details[1].alpha_id, "a2");
        assert_eq!(details[1].expression_type, Category::Momentum);
    }

    #[test]
    fn test_remove_ids_keeps_remaining_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.ids_path(), "a1\n\na2\na3\n").unwrap();

        let remaining = store.remove_ids(&["a2".to_string()]).unwrap();

        assert_eq!(remaining, 2);
        assert_eq!(store.load_ids().unwrap(), vec!["a1", "a3"]);
    }

    #[test]
    fn test_corrupt_details_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(dir.path().join("alpha_details.json"), "[{broken").unwrap();

        store.save(&outcome("a1")).unwrap();

        assert_eq!(store.load_details().len(), 1);
    }
}
