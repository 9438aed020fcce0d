use serde::Serialize;
use std::collections::BTreeMap;

/// 作答记录：题目下标 → 选项下标
///
/// 每题最多一个答案，后写覆盖先写；条目只增不删。
/// JSON 中 key 序列化为字符串（`{"0": 1}`），与评分接口一致
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<usize, usize>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录答案，返回之前的选项
    pub fn set(&mut self, question_index: usize, option_index: usize) -> Option<usize> {
        self.0.insert(question_index, option_index)
    }

    pub fn get(&self, question_index: usize) -> Option<usize> {
        self.0.get(&question_index).copied()
    }

    pub fn is_answered(&self, question_index: usize) -> bool {
        self.0.contains_key(&question_index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(q, o)| (*q, *o))
    }
}

impl FromIterator<(usize, usize)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        let mut map = AnswerMap::new();
        for (q, o) in iter {
            map.set(q, o);
        }
        map
    }
}
