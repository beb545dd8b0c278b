use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;
use tempfile::TempDir;

/// Isolated home for one run of the govm binary. Network endpoints point at
/// a closed local port unless a test overrides them.
#[allow(dead_code)]
pub struct TestContext {
    pub home: TempDir,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp dir"),
            bin_path: PathBuf::from(env!("CARGO_BIN_EXE_govm")),
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.home.path().join(".govm").join("govm.log")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("HOME", self.home.path());
        cmd.env("GOVM_HOME", self.home.path());
        cmd.env("GOVM_VERSIONS_URL", "http://127.0.0.1:9/dl/?mode=json");
        cmd.env("GOVM_DOWNLOAD_URL", "http://127.0.0.1:9/dl/{filename}");
        cmd.env("GOVM_HTTP_TIMEOUT_SECS", "5");
        cmd.env_remove("RUST_LOG");
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Runs `args`, feeding `input` on stdin.
    pub fn run_with_input(&self, args: &[&str], input: &str) -> CommandOutput {
        let mut child = self
            .cmd()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to run govm");

        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("Failed to write stdin");

        child.wait_with_output().expect("Failed to wait for govm").into()
    }

    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .args(args)
            .output()
            .expect("Failed to run govm")
            .into()
    }
}

/// Serves `body` with `200 OK` to exactly one request; returns the base URL.
#[allow(dead_code)]
pub fn serve_once(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("No connection");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
    });

    format!("http://{}", addr)
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_exit_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.status.code(),
            Some(code),
            "Unexpected exit status\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
