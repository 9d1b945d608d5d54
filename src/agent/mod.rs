use crate::config::Settings;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("agent program `{program}` not found on PATH")]
    MissingProgram { program: String },
    #[error("failed to spawn agent `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("agent timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("agent exited with code {exit_code}")]
    NonZeroExit {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    #[error("agent io failure: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

/// One bounded invocation of the external processing step.
#[derive(Debug, Clone)]
pub struct AgentInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
}

/// Captured result of a successful (exit 0) invocation. Output is logged by
/// the caller, never parsed.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Instruction prompt handed to the agent for one task record. The agent is
/// expected to relocate the record itself when its work is finished.
pub fn build_task_prompt(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    let date = chrono::Utc::now().format("%Y%m%d");

    format!(
        "New task detected: {filename}\n\
         \n\
         Analyze the task record at Active/{filename}. Determine the task type\n\
         and priority from its frontmatter.\n\
         \n\
         Follow every rule in Company_Handbook.md, and consult\n\
         Business_Goals.md for context.\n\
         \n\
         Steps to execute:\n\
         1. Read the task record and understand its content and priority.\n\
         2. Create a plan file at Plan/PLAN_{stem}.md with checkboxed steps.\n\
         3. If the task needs human sign-off (payments, sensitive actions),\n\
            create a record in PendingApproval/ explaining what needs approval\n\
            and why.\n\
         4. Execute safe, non-financial actions from the plan.\n\
         5. Log every decision to AuditLog/DECISION_{date}_{stem}.md.\n\
         6. If all steps are complete and no approval is pending, move the\n\
            record to Completed/. Otherwise leave it in Active/ and note what\n\
            is blocked.\n"
    )
}

/// Builds the invocation for one Inbox task from the configured settings.
pub fn invocation_for_task(
    settings: &Settings,
    store_root: &Path,
    filename: &str,
) -> AgentInvocation {
    AgentInvocation {
        program: settings.agent_program.clone(),
        args: vec![
            "-p".to_string(),
            build_task_prompt(filename),
            "--allowedTools".to_string(),
            settings.agent_allowed_tools.clone(),
        ],
        cwd: store_root.to_path_buf(),
        timeout: settings.agent_timeout(),
    }
}

/// Runs the agent subprocess with piped output and a hard deadline. Timeout,
/// non-zero exit, and a missing program are all reported as errors, so the
/// dispatcher treats every non-success uniformly.
pub fn run_agent(invocation: &AgentInvocation) -> Result<AgentOutcome, AgentError> {
    let mut command = Command::new(&invocation.program);
    command
        .current_dir(&invocation.cwd)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // A nested agent session refuses to start while this is set.
        .env_remove("CLAUDECODE");

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AgentError::MissingProgram {
                program: invocation.program.clone(),
            })
        }
        Err(source) => {
            return Err(AgentError::Spawn {
                program: invocation.program.clone(),
                source,
            })
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AgentError::Io {
            source: std::io::Error::other("missing stdout pipe"),
        })?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AgentError::Io {
            source: std::io::Error::other("missing stderr pipe"),
        })?;

    let stdout_reader = thread::spawn(move || {
        let mut buf = String::new();
        let _ = BufReader::new(stdout).read_to_string(&mut buf);
        buf
    });
    let stderr_reader = thread::spawn(move || {
        let mut buf = String::new();
        let _ = BufReader::new(stderr).read_to_string(&mut buf);
        buf
    });

    let start = Instant::now();
    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > invocation.timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_reader.join();
                    let _ = stderr_reader.join();
                    return Err(AgentError::Timeout {
                        timeout_ms: invocation.timeout.as_millis() as u64,
                    });
                }
                thread::sleep(Duration::from_millis(10));
            }
            Err(source) => return Err(AgentError::Io { source }),
        }
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    if !exit_status.success() {
        return Err(AgentError::NonZeroExit {
            exit_code: exit_status.code().unwrap_or(-1),
            stdout,
            stderr,
        });
    }

    Ok(AgentOutcome {
        exit_code: exit_status.code().unwrap_or(0),
        stdout,
        stderr,
        duration: start.elapsed(),
    })
}
