//! 断点续传记录 - 业务能力层
//!
//! 记录所有尝试过的（表达式, 关键参数）组合，进程重启后跳过已测试的候选。
//!
//! - 启动时整体读入；文件缺失或损坏时视为空记录，不会报错
//! - 每新增 10 条记录整体落盘一次，会话结束或收到中断信号时再落盘
//! - 落盘使用"临时文件 + 重命名"，进程中途被杀也不会留下半截文件

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value as JsonValue};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, FileError};
use crate::models::outcome::now_timestamp;
use crate::models::{Candidate, JobOutcome};
use crate::utils::write_atomic;

/// 每新增多少条记录落盘一次
pub const FLUSH_INTERVAL: usize = 10;

/// 参与指纹计算的参数（按字母序）
pub const KEY_PARAMS: [&str; 4] = ["decay", "neutralization", "truncation", "universe"];

/// (表达式, 关键参数) 的内容哈希
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// 计算指纹
    ///
    /// 只取 `KEY_PARAMS` 中的字段，按名称排序后拼接在表达式之后；
    /// 参数为空时只对表达式求哈希。
    pub fn compute(expression: &str, params: &JsonValue) -> Self {
        let mut content = expression.to_string();

        if let Some(map) = params.as_object().filter(|m| !m.is_empty()) {
            let key_params: Vec<(&str, &JsonValue)> = KEY_PARAMS
                .iter()
                .map(|key| (*key, map.get(*key).unwrap_or(&JsonValue::Null)))
                .collect();
            content.push_str(&serde_json::to_string(&key_params).unwrap_or_default());
        }

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 单条测试记录，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub expression: String,
    pub parameters: JsonValue,
    pub timestamp: String,
    /// 模拟结果；模拟失败时为空对象
    #[serde(default)]
    pub result: JsonValue,
}

/// 断点续传统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeStats {
    /// 累计测试记录
    pub total_tested: usize,
    /// 本次会话新增记录
    pub session_tested: usize,
}

/// 断点续传记录
pub struct TestLedger {
    path: PathBuf,
    order: Vec<Fingerprint>,
    entries: HashMap<Fingerprint, LedgerEntry>,
    session_new: usize,
    flush_count: usize,
    interrupted: bool,
}

impl TestLedger {
    /// 从文件加载记录；文件缺失或损坏时返回空记录
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut ledger = Self {
            path,
            order: Vec::new(),
            entries: HashMap::new(),
            session_new: 0,
            flush_count: 0,
            interrupted: false,
        };

        if !ledger.path.exists() {
            return ledger;
        }

        match read_entries(&ledger.path) {
            Ok(entries) => {
                for (fingerprint, entry) in entries {
                    if ledger.entries.insert(fingerprint.clone(), entry).is_none() {
                        ledger.order.push(fingerprint);
                    }
                }
                info!("加载断点续传记录: {} 个已测试表达式", ledger.order.len());
            }
            Err(e) => {
                warn!("⚠️ 加载断点续传记录失败: {}，从空记录开始", e);
            }
        }

        ledger
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&LedgerEntry> {
        self.entries.get(fingerprint)
    }

    /// 已落盘次数
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn is_tested(&self, expression: &str, params: &JsonValue) -> bool {
        self.entries
            .contains_key(&Fingerprint::compute(expression, params))
    }

    /// 标记为已测试
    ///
    /// 指纹已存在时不做任何修改并返回 false。每新增 `FLUSH_INTERVAL` 条落盘一次，
    /// 周期性落盘失败只记录警告。
    pub fn mark_tested(
        &mut self,
        expression: &str,
        params: &JsonValue,
        outcome: Option<&JobOutcome>,
    ) -> bool {
        let fingerprint = Fingerprint::compute(expression, params);
        if self.entries.contains_key(&fingerprint) {
            debug!("指纹 {} 已存在，跳过记录", fingerprint);
            return false;
        }

        let result = outcome
            .and_then(|o| serde_json::to_value(o).ok())
            .unwrap_or_else(|| json!({}));

        let entry = LedgerEntry {
            expression: expression.to_string(),
            parameters: params.clone(),
            timestamp: now_timestamp(),
            result,
        };

        self.entries.insert(fingerprint.clone(), entry);
        self.order.push(fingerprint);
        self.session_new += 1;

        if self.session_new % FLUSH_INTERVAL == 0 {
            if let Err(e) = self.flush() {
                warn!("⚠️ 保存断点续传记录失败: {}", e);
            }
        }

        true
    }

    /// 过滤出未测试的候选，保持原有顺序
    ///
    /// # 返回
    /// 返回 (未测试的候选, 跳过数量)
    pub fn filter_untested(&self, candidates: Vec<Candidate>) -> (Vec<Candidate>, usize) {
        info!("检查断点续传记录...");

        let total = candidates.len();
        let untested: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| !self.is_tested(&c.expression, &c.parameters()))
            .collect();
        let skipped = total - untested.len();

        if skipped > 0 {
            info!("跳过 {} 个已测试的Alpha表达式", skipped);
            info!("继续测试 {} 个未测试的Alpha表达式", untested.len());
        }

        (untested, skipped)
    }

    /// 整体写入文件
    pub fn flush(&mut self) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(&OrderedEntries(self))?;
        write_atomic(&self.path, contents.as_bytes())
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        self.flush_count += 1;
        debug!("断点续传记录已保存: {} 条", self.order.len());
        Ok(())
    }

    /// 中断处理：标记中断并立即落盘
    pub fn interrupt(&mut self) -> AppResult<()> {
        self.interrupted = true;
        self.flush()?;
        info!("💾 进度已保存，下次运行将从中断点继续");
        info!("如需重新开始完整测试，请使用 --clear-resume");
        Ok(())
    }

    /// 会话正常结束：未被中断时落盘并输出统计
    pub fn finalize_session(&mut self) -> AppResult<()> {
        if self.interrupted {
            return Ok(());
        }
        self.flush()?;
        let stats = self.stats();
        info!("\n会话结束，已保存 {} 个新测试记录", stats.session_tested);
        info!("累计测试记录: {} 个Alpha表达式", stats.total_tested);
        Ok(())
    }

    pub fn stats(&self) -> ResumeStats {
        ResumeStats {
            total_tested: self.order.len(),
            session_tested: self.session_new,
        }
    }

    /// 删除记录文件并清空内存状态
    pub fn clear(&mut self) -> AppResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| {
                AppError::File(FileError::DeleteFailed {
                    path: self.path.display().to_string(),
                    source: e,
                })
            })?;
            info!("已清除断点续传记录: {}", self.path.display());
        }

        self.order.clear();
        self.entries.clear();
        self.session_new = 0;
        self.interrupted = false;
        Ok(())
    }
}

/// 按插入顺序序列化为 JSON 对象
struct OrderedEntries<'a>(&'a TestLedger);

impl Serialize for OrderedEntries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ledger = self.0;
        let mut map = serializer.serialize_map(Some(ledger.order.len()))?;
        for fingerprint in &ledger.order {
            if let Some(entry) = ledger.entries.get(fingerprint) {
                map.serialize_entry(fingerprint, entry)?;
            }
        }
        map.end()
    }
}

fn read_entries(path: &Path) -> AppResult<Vec<(Fingerprint, LedgerEntry)>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
    let raw: Map<String, JsonValue> = serde_json::from_str(&content)?;

    raw.into_iter()
        .map(|(key, value)| -> AppResult<(Fingerprint, LedgerEntry)> {
            Ok((Fingerprint(key), serde_json::from_value(value)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Neutralization, SelectedParameters};

    fn params(universe: &str, neutralization: &str, decay: u32, truncation: f64) -> JsonValue {
        json!({
            "universe": universe,
            "neutralization": neutralization,
            "decay": decay,
            "truncation": truncation,
        })
    }

    fn candidate(expression: &str) -> Candidate {
        Candidate::new(
            expression,
            &SelectedParameters {
                universe: "TOP3000".to_string(),
                neutralization: Neutralization::Market,
                decay: 4,
                truncation: 0.08,
                category: Category::Default,
            },
        )
    }

    fn ledger_in(dir: &tempfile::TempDir) -> TestLedger {
        TestLedger::load(dir.path().join("alpha_resume.json"))
    }

    #[test]
    fn test_key_params_are_sorted() {
        let mut sorted = KEY_PARAMS;
        sorted.sort();
        assert_eq!(sorted, KEY_PARAMS);
    }

    #[test]
    fn test_fingerprint_ignores_parameter_order() {
        let forward = json!({"universe": "TOP500", "neutralization": "MARKET", "decay": 3, "truncation": 0.05});
        let backward = json!({"truncation": 0.05, "decay": 3, "neutralization": "MARKET", "universe": "TOP500"});

        assert_eq!(
            Fingerprint::compute("rank(close)", &forward),
            Fingerprint::compute("rank(close)", &backward)
        );
    }

    #[test]
    fn test_fingerprint_differs_on_each_key_param() {
        let base = params("TOP500", "MARKET", 3, 0.05);
        let variants = [
            params("TOP1000", "MARKET", 3, 0.05),
            params("TOP500", "SECTOR", 3, 0.05),
            params("TOP500", "MARKET", 4, 0.05),
            params("TOP500", "MARKET", 3, 0.051),
        ];

        let base_fp = Fingerprint::compute("rank(close)", &base);
        for variant in &variants {
            assert_ne!(base_fp, Fingerprint::compute("rank(close)", variant));
        }
    }

    #[test]
    fn test_fingerprint_ignores_fixed_fields() {
        let mut with_fixed = params("TOP500", "MARKET", 3, 0.05);
        with_fixed["region"] = json!("USA");
        with_fixed["pasteurization"] = json!("ON");

        assert_eq!(
            Fingerprint::compute("rank(close)", &params("TOP500", "MARKET", 3, 0.05)),
            Fingerprint::compute("rank(close)", &with_fixed)
        );
    }

    #[test]
    fn test_filter_untested_keeps_order_and_counts_skips() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ledger_in(&dir);

        let c1 = candidate("rank(f1)");
        let c2 = candidate("rank(f2)");
        ledger.mark_tested(&c1.expression, &c1.parameters(), None);
        ledger.mark_tested(&c2.expression, &c2.parameters(), None);

        let input = vec![candidate("rank(f1)"), candidate("rank(f3)"), candidate("rank(f4)")];
        let (untested, skipped) = ledger.filter_untested(input);

        assert_eq!(skipped, 1);
        let expressions: Vec<_> = untested.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(expressions, vec!["rank(f3)", "rank(f4)"]);
    }

    #[test]
    fn test_nine_new_entries_do_not_flush() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ledger_in(&dir);

        for i in 0..9 {
            ledger.mark_tested(&format!("rank(f{})", i), &params("TOP500", "MARKET", 3, 0.05), None);
        }

        assert_eq!(ledger.flush_count(), 0);
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_tenth_new_entry_flushes_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ledger_in(&dir);

        for i in 0..10 {
            ledger.mark_tested(&format!("rank(f{})", i), &params("TOP500", "MARKET", 3, 0.05), None);
        }

        assert_eq!(ledger.flush_count(), 1);
        assert_eq!(TestLedger::load(ledger.path()).len(), 10);
    }

    #[test]
    fn test_duplicate_mark_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ledger_in(&dir);
        let p = params("TOP500", "MARKET", 3, 0.05);

        assert!(ledger.mark_tested("rank(close)", &p, None));
        let first = ledger.get(&Fingerprint::compute("rank(close)", &p)).cloned();
        for _ in 0..20 {
            assert!(!ledger.mark_tested("rank(close)", &p, None));
        }

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.stats().session_tested, 1);
        assert_eq!(ledger.flush_count(), 0);
        assert_eq!(ledger.get(&Fingerprint::compute("rank(close)", &p)).cloned(), first);
    }

    #[test]
    fn test_interrupt_persists_entries_marked_so_far() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ledger_in(&dir);

        for i in 0..7 {
            ledger.mark_tested(&format!("rank(f{})", i), &params("TOP500", "MARKET", 3, 0.05), None);
        }
        ledger.interrupt().unwrap();
        ledger.finalize_session().unwrap();

        assert_eq!(ledger.flush_count(), 1);
        let recovered = TestLedger::load(ledger.path());
        assert_eq!(recovered.len(), 7);
        assert!(recovered.is_tested("rank(f6)", &params("TOP500", "MARKET", 3, 0.05)));
    }

    #[test]
    fn test_persisted_file_keeps_session_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ledger_in(&dir);
        for expr in ["rank(z)", "rank(a)", "rank(m)"] {
            ledger.mark_tested(expr, &params("TOP500", "MARKET", 3, 0.05), None);
        }
        ledger.finalize_session().unwrap();

        let raw: Map<String, JsonValue> =
            serde_json::from_str(&std::fs::read_to_string(ledger.path()).unwrap()).unwrap();
        let expressions: Vec<_> = raw
            .values()
            .map(|v| v["expression"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(expressions, vec!["rank(z)", "rank(a)", "rank(m)"]);
    }

    #[test]
    fn test_corrupt_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha_resume.json");
        std::fs::write(&path, "{ not json").unwrap();

        let ledger = TestLedger::load(&path);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_clear_removes_file_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = ledger_in(&dir);
        ledger.mark_tested("rank(close)", &params("TOP500", "MARKET", 3, 0.05), None);
        ledger.flush().unwrap();

        ledger.clear().unwrap();

        assert!(ledger.is_empty());
        assert!(!ledger.path().exists());
        assert_eq!(ledger.stats(), ResumeStats::default());
    }
}
