use std::ops::Range;

/// 翻页请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Previous,
    First,
    Last,
    /// 指定页（允许越界，结果会被夹到合法范围）
    Page(i64),
    /// 跳到题目所在页（答题卡），越界时落到最后一页
    Question(usize),
}

/// 题目分页游标
///
/// 每页 `page_size` 题，页码从 0 开始，始终落在 `[0, total_pages - 1]`
#[derive(Debug, Clone)]
pub struct Pager {
    page_size: usize,
    question_count: usize,
    current: usize,
}

impl Pager {
    pub fn new(question_count: usize, page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            question_count,
            current: 0,
        }
    }

    /// 总页数，没有题目时也算一页
    pub fn total_pages(&self) -> usize {
        self.question_count.div_ceil(self.page_size).max(1)
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_last_page(&self) -> bool {
        self.current + 1 == self.total_pages()
    }

    /// 移动游标，返回新的页码
    pub fn navigate(&mut self, to: Navigation) -> usize {
        let last = self.total_pages() - 1;
        self.current = match to {
            Navigation::Next => (self.current + 1).min(last),
            Navigation::Previous => self.current.saturating_sub(1),
            Navigation::First => 0,
            Navigation::Last => last,
            Navigation::Page(page) if page < 0 => 0,
            Navigation::Page(page) => usize::try_from(page).unwrap_or(usize::MAX).min(last),
            Navigation::Question(index) => self.page_of(index).unwrap_or(last),
        };
        self.current
    }

    /// 当前页包含的题目下标
    pub fn question_range(&self) -> Range<usize> {
        let start = (self.current * self.page_size).min(self.question_count);
        let end = (start + self.page_size).min(self.question_count);
        start..end
    }

    /// 题目所在页（答题卡跳转用）
    pub fn page_of(&self, question_index: usize) -> Option<usize> {
        (question_index < self.question_count).then(|| question_index / self.page_size)
    }
}
