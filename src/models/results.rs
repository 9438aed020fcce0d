use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 交卷后的得分
///
/// `attempt_number` 由服务端按用户和考试递增，客户端从不计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamResult {
    pub score: u32,
    pub total: u32,
    #[serde(alias = "attempt")]
    pub attempt_number: u32,
}

impl ExamResult {
    /// 得分百分比（四舍五入）
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((f64::from(self.score) / f64::from(self.total)) * 100.0).round() as u32
    }
}

/// 历史考试记录（只读）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    pub exam_title: String,
    pub score: u32,
    pub total_questions: u32,
    pub attempt_number: u32,
    #[serde(deserialize_with = "crate::models::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "duration_taken", default)]
    pub duration_taken_seconds: u64,
}

impl HistoryEntry {
    /// 得分不低于一半视为通过
    pub fn passed(&self) -> bool {
        self.total_questions > 0 && u64::from(self.score) * 2 >= u64::from(self.total_questions)
    }
}

/// 教师查看的学生成绩
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeacherResult {
    pub username: String,
    pub exam_title: String,
    pub score: u32,
    pub total_questions: u32,
    #[serde(deserialize_with = "crate::models::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_accepts_attempt_alias() {
        let result: ExamResult =
            serde_json::from_str(r#"{"message": "ok", "score": 2, "total": 3, "attempt": 4}"#)
                .unwrap();
        assert_eq!(result.attempt_number, 4);
        assert_eq!(result.percentage(), 67);
    }

    #[test]
    fn test_percentage_of_empty_exam() {
        let result = ExamResult {
            score: 0,
            total: 0,
            attempt_number: 1,
        };
        assert_eq!(result.percentage(), 0);
    }

    #[test]
    fn test_history_entry_from_legacy_record() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{
                "_id": "r1",
                "exam_title": "Địa lý",
                "score": 5,
                "total_questions": 10,
                "attempt_number": 2,
                "duration_taken": 412,
                "timestamp": "Mon, 19 Oct 2026 10:05:00 GMT"
            }"#,
        )
        .unwrap();

        assert_eq!(entry.duration_taken_seconds, 412);
        assert!(entry.passed());
    }

    #[test]
    fn test_passed_with_out_of_range_score() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{
                "exam_title": "Toán",
                "score": 4294967295,
                "total_questions": 4294967295,
                "attempt_number": 1,
                "timestamp": 1760868300
            }"#,
        )
        .unwrap();
        assert!(entry.passed());

        let failed = HistoryEntry {
            score: 2_147_483_647,
            ..entry
        };
        assert!(!failed.passed());
    }
}
