//! 候选处理上下文
//!
//! 封装"我正在处理第几个候选"这一信息，仅用于日志

use std::fmt::Display;

#[derive(Debug, Clone, Copy)]
pub struct JobCtx {
    /// 当前候选序号（从 1 开始，按续传前的原始数量计）
    pub index: usize,

    /// 原始候选总数
    pub total: usize,
}

impl JobCtx {
    pub fn new(index: usize, total: usize) -> Self {
        Self { index, total }
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}]", self.index, self.total)
    }
}
