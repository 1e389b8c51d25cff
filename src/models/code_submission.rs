use crate::models::Id;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompilationStatus {
    #[default]
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    #[default]
    NotExecuted,
    Success,
    RuntimeError,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    SystemError,
}

impl ExecutionStatus {
    pub fn display_name(self) -> &'static str {
        match self {
            ExecutionStatus::NotExecuted => "Not Executed",
            ExecutionStatus::Success => "Execution Successful",
            ExecutionStatus::RuntimeError => "Runtime Error",
            ExecutionStatus::TimeLimitExceeded => "Time Limit Exceeded",
            ExecutionStatus::MemoryLimitExceeded => "Memory Limit Exceeded",
            ExecutionStatus::SystemError => "System Error",
        }
    }

    pub fn has_error(self) -> bool {
        matches!(self, ExecutionStatus::RuntimeError | ExecutionStatus::SystemError)
    }

    pub fn has_limit_exceeded(self) -> bool {
        matches!(
            self,
            ExecutionStatus::TimeLimitExceeded | ExecutionStatus::MemoryLimitExceeded
        )
    }
}

/// Outcome of running one test case, reported by the external code-execution service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseExecutionResult {
    pub test_case_id: Id,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
    #[serde(default)]
    pub memory_used_mb: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TestCaseExecutionResult {
    pub fn passed(test_case_id: Id) -> Self {
        Self {
            test_case_id,
            passed: true,
            actual_output: None,
            execution_time_ms: 0,
            memory_used_mb: 0,
            error_message: None,
        }
    }

    pub fn failed(test_case_id: Id) -> Self {
        Self {
            passed: false,
            ..Self::passed(test_case_id)
        }
    }

    pub fn has_error(&self) -> bool {
        self.error_message
            .as_deref()
            .map_or(false, |e| !e.trim().is_empty())
    }

    pub fn status(&self) -> &'static str {
        if self.passed {
            "PASSED"
        } else if self.has_error() {
            "ERROR"
        } else {
            "FAILED"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeSubmission {
    pub source_code: String,
    pub programming_language: String,
    #[serde(default)]
    pub compilation_status: CompilationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compilation_error: Option<String>,
    #[serde(default)]
    pub execution_status: ExecutionStatus,
    #[serde(default)]
    pub test_case_results: Vec<TestCaseExecutionResult>,
}

impl CodeSubmission {
    pub fn new(source_code: impl Into<String>, programming_language: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            programming_language: programming_language.into(),
            ..Default::default()
        }
    }

    pub fn with_results(mut self, results: Vec<TestCaseExecutionResult>) -> Self {
        self.compilation_status = CompilationStatus::Success;
        self.execution_status = ExecutionStatus::Success;
        self.test_case_results = results;
        self
    }

    pub fn is_compiled(&self) -> bool {
        self.compilation_status == CompilationStatus::Success
    }

    pub fn has_compilation_error(&self) -> bool {
        self.compilation_status == CompilationStatus::Error
    }

    pub fn is_executed(&self) -> bool {
        self.execution_status != ExecutionStatus::NotExecuted
    }

    pub fn passed_count(&self) -> usize {
        self.test_case_results.iter().filter(|r| r.passed).count()
    }

    /// Pass rate over the results actually reported, not over the assignment's configured cases.
    pub fn passing_percentage(&self) -> f64 {
        let total = self.test_case_results.len();
        if total == 0 {
            return 0.0;
        }
        self.passed_count() as f64 / total as f64 * 100.0
    }

    pub fn is_successful(&self) -> bool {
        self.is_compiled()
            && self.execution_status == ExecutionStatus::Success
            && self.passed_count() == self.test_case_results.len()
    }

    pub fn status_summary(&self) -> String {
        if self.has_compilation_error() {
            "Compilation Error".to_string()
        } else if !self.is_executed() {
            "Not Executed".to_string()
        } else if self.execution_status == ExecutionStatus::RuntimeError {
            "Runtime Error".to_string()
        } else {
            format!(
                "Passed {}/{} tests ({:.1}%)",
                self.passed_count(),
                self.test_case_results.len(),
                self.passing_percentage()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_summary_reflects_pipeline_stage() {
        let mut submission = CodeSubmission::new("fn main() {}", "rust");
        assert_eq!(submission.status_summary(), "Not Executed");

        submission.compilation_status = CompilationStatus::Error;
        assert_eq!(submission.status_summary(), "Compilation Error");

        let submission = CodeSubmission::new("fn main() {}", "rust").with_results(vec![
            TestCaseExecutionResult::passed(1),
            TestCaseExecutionResult::failed(2),
            TestCaseExecutionResult::passed(3),
            TestCaseExecutionResult::passed(4),
        ]);
        assert_eq!(submission.status_summary(), "Passed 3/4 tests (75.0%)");
        assert!(!submission.is_successful());
    }

    #[test]
    fn execution_result_status() {
        let mut result = TestCaseExecutionResult::failed(1);
        assert_eq!(result.status(), "FAILED");
        result.error_message = Some("segfault".to_string());
        assert_eq!(result.status(), "ERROR");
        assert_eq!(TestCaseExecutionResult::passed(1).status(), "PASSED");
        assert!(ExecutionStatus::TimeLimitExceeded.has_limit_exceeded());
        assert!(ExecutionStatus::SystemError.has_error());
    }
}
