// Job Snapshot Domain Model

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Caller-supplied job identifier (primary key of a snapshot)
pub type ClientId = String;

/// Job status as seen by pollers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Queued,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Error,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "QUEUED" => Ok(JobStatus::Queued),
            "PROCESSING" => Ok(JobStatus::Processing),
            "COMPLETED" => Ok(JobStatus::Completed),
            "ERROR" => Ok(JobStatus::Error),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Sub-state of `Processing`: which pipeline step is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelinePhase {
    Translating,
    Transforming,
    Retranslating,
}

impl PipelinePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelinePhase::Translating => "TRANSLATING",
            PipelinePhase::Transforming => "TRANSFORMING",
            PipelinePhase::Retranslating => "RETRANSLATING",
        }
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PipelinePhase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TRANSLATING" => Ok(PipelinePhase::Translating),
            "TRANSFORMING" => Ok(PipelinePhase::Transforming),
            "RETRANSLATING" => Ok(PipelinePhase::Retranslating),
            other => Err(DomainError::UnknownPhase(other.to_string())),
        }
    }
}

/// Complete persisted state of one job at a point in time.
///
/// Mutators enforce the state machine:
/// `QUEUED -> PROCESSING(TRANSLATING -> TRANSFORMING -> RETRANSLATING) -> COMPLETED`,
/// with `ERROR` reachable from any non-terminal state. Once terminal, every mutator
/// returns [`DomainError::TerminalSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub client_id: ClientId,
    pub original_text: String,
    pub target_language: String,

    pub status: JobStatus,
    pub phase: Option<PipelinePhase>,

    pub start_time: Option<i64>,      // epoch ms
    pub completion_time: Option<i64>, // epoch ms, set iff terminal
    pub time_remaining: i64,          // seconds, advisory

    pub packet_count: usize,
    pub packets_processed: usize,

    pub translated_text: String,

    // Stage A: text transform
    pub stage_a_done: bool,
    pub stage_a_output: String,

    // Stage B: secondary translation
    pub stage_b_done: bool,
    pub stage_b_output: String,
}

impl JobSnapshot {
    /// Fresh snapshot for an admitted job
    pub fn queued(
        client_id: impl Into<String>,
        original_text: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            original_text: original_text.into(),
            target_language: target_language.into(),
            status: JobStatus::Queued,
            phase: None,
            start_time: None,
            completion_time: None,
            time_remaining: 0,
            packet_count: 0,
            packets_processed: 0,
            translated_text: String::new(),
            stage_a_done: false,
            stage_a_output: String::new(),
            stage_b_done: false,
            stage_b_output: String::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// QUEUED -> PROCESSING(TRANSLATING)
    pub fn start(
        &mut self,
        packet_count: usize,
        now_millis: i64,
        time_remaining_secs: i64,
    ) -> Result<()> {
        self.ensure_active()?;
        if self.status != JobStatus::Queued {
            return Err(self.transition_error("PROCESSING"));
        }
        self.status = JobStatus::Processing;
        self.phase = Some(PipelinePhase::Translating);
        self.start_time = Some(now_millis);
        self.time_remaining = time_remaining_secs;
        self.packet_count = packet_count;
        self.packets_processed = 0;
        Ok(())
    }

    /// Count one more translated packet
    pub fn record_packet(&mut self) -> Result<()> {
        self.ensure_phase(PipelinePhase::Translating)?;
        if self.packets_processed >= self.packet_count {
            return Err(DomainError::PacketOverflow {
                processed: self.packets_processed,
                total: self.packet_count,
            });
        }
        self.packets_processed += 1;
        Ok(())
    }

    /// TRANSLATING -> TRANSFORMING; every packet must be accounted for
    pub fn begin_transform(&mut self) -> Result<()> {
        self.ensure_phase(PipelinePhase::Translating)?;
        if self.packets_processed != self.packet_count {
            return Err(DomainError::IncompleteTranslation {
                processed: self.packets_processed,
                total: self.packet_count,
            });
        }
        self.phase = Some(PipelinePhase::Transforming);
        Ok(())
    }

    pub fn record_transform(&mut self, output: impl Into<String>) -> Result<()> {
        self.ensure_phase(PipelinePhase::Transforming)?;
        self.stage_a_done = true;
        self.stage_a_output = output.into();
        Ok(())
    }

    /// TRANSFORMING -> RETRANSLATING
    pub fn begin_retranslation(&mut self) -> Result<()> {
        self.ensure_phase(PipelinePhase::Transforming)?;
        if !self.stage_a_done {
            return Err(self.transition_error(PipelinePhase::Retranslating.as_str()));
        }
        self.phase = Some(PipelinePhase::Retranslating);
        Ok(())
    }

    pub fn record_retranslation(&mut self, output: impl Into<String>) -> Result<()> {
        self.ensure_phase(PipelinePhase::Retranslating)?;
        self.stage_b_done = true;
        self.stage_b_output = output.into();
        Ok(())
    }

    /// PROCESSING(RETRANSLATING, stage B done) -> COMPLETED
    pub fn complete(&mut self, final_text: impl Into<String>, now_millis: i64) -> Result<()> {
        self.ensure_phase(PipelinePhase::Retranslating)?;
        if !self.stage_b_done {
            return Err(self.transition_error("COMPLETED"));
        }
        self.status = JobStatus::Completed;
        self.phase = None;
        self.translated_text = final_text.into();
        self.completion_time = Some(now_millis);
        self.time_remaining = 0;
        Ok(())
    }

    /// Any non-terminal state -> ERROR. Accumulated progress is kept.
    pub fn fail(&mut self, description: impl Into<String>, now_millis: i64) -> Result<()> {
        self.ensure_active()?;
        self.status = JobStatus::Error;
        self.phase = None;
        self.translated_text = description.into();
        self.completion_time = Some(now_millis);
        self.time_remaining = 0;
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_terminal() {
            return Err(DomainError::TerminalSnapshot {
                client_id: self.client_id.clone(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_phase(&self, expected: PipelinePhase) -> Result<()> {
        self.ensure_active()?;
        if self.status != JobStatus::Processing || self.phase != Some(expected) {
            return Err(DomainError::InvalidStateTransition {
                from: self.describe_state(),
                to: expected.to_string(),
            });
        }
        Ok(())
    }

    fn transition_error(&self, to: &str) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.describe_state(),
            to: to.to_string(),
        }
    }

    fn describe_state(&self) -> String {
        match self.phase {
            Some(phase) => format!("{}({})", self.status, phase),
            None => self.status.to_string(),
        }
    }
}
