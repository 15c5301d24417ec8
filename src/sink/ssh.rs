//! Interactive SSH session to an IOS device.
//!
//! Uses the ssh2 crate (libssh2) with blocking I/O: password authentication
//! with a keyboard-interactive fallback, a PTY shell channel, and a
//! line-by-line exchange that waits for the prompt after every command.

use super::response::{at_privileged_prompt, at_prompt, rejection, PATTERNS};
use super::{BlockOutcome, CommandSink, SessionError};
use crate::commands::CommandBlock;
use log::{debug, info, warn};
use ssh2::{Channel, Session};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Where and how to log in
#[derive(Clone)]
pub struct DeviceTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Secret for `enable`, when the login lands in user EXEC mode
    pub enable_secret: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for DeviceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// An authenticated shell on the device.
///
/// Dropping the session closes the channel and disconnects.
pub struct SshSession {
    session: Session,
    channel: Channel,
    timeout: Duration,
}

impl SshSession {
    /// Connect, authenticate and open a shell ready for commands
    pub fn connect(target: &DeviceTarget) -> Result<Self, SessionError> {
        let addr = format!("{}:{}", target.host, target.port);
        info!("Connecting to {} as '{}'", addr, target.username);

        let socket = addr
            .to_socket_addrs()
            .map_err(|source| SessionError::Connect {
                addr: addr.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| SessionError::Resolve { addr: addr.clone() })?;
        let tcp = TcpStream::connect_timeout(&socket, target.timeout)
            .map_err(|source| SessionError::Connect {
                addr: addr.clone(),
                source,
            })?;
        tcp.set_read_timeout(Some(target.timeout)).ok();
        tcp.set_write_timeout(Some(target.timeout)).ok();

        let mut session = Session::new().map_err(SessionError::Handshake)?;
        session.set_tcp_stream(tcp);
        session.set_timeout(target.timeout.as_millis().min(u128::from(u32::MAX)) as u32);
        session.handshake().map_err(SessionError::Handshake)?;
        authenticate(&session, &target.username, &target.password)?;

        let mut channel = session.channel_session().map_err(SessionError::Channel)?;
        channel
            .request_pty("vt100", None, Some((200, 24, 0, 0)))
            .map_err(SessionError::Channel)?;
        channel.shell().map_err(SessionError::Channel)?;

        let mut shell = Self {
            session,
            channel,
            timeout: target.timeout,
        };
        let banner = shell.read_until_prompt("login")?;
        debug!("Login banner: {}", banner.trim());

        if let Some(secret) = &target.enable_secret {
            shell.enable(&target.username, secret)?;
        }
        shell.exec("terminal length 0")?;
        info!("Connection established");
        Ok(shell)
    }

    /// Send one line and return the device output up to the next prompt
    pub fn exec(&mut self, command: &str) -> Result<String, SessionError> {
        self.write_line(command)?;
        let output = self.read_until_prompt(command)?;
        debug!("{} -> {}", command, output.trim());
        Ok(output)
    }

    fn enable(&mut self, user: &str, secret: &str) -> Result<(), SessionError> {
        self.write_line("enable")?;
        let mut output = self.read_until(|buffer| PATTERNS.password.is_match(buffer) || at_prompt(buffer))?;
        if PATTERNS.password.is_match(&output) {
            self.write_line(secret)?;
            output = self.read_until_prompt("enable")?;
        }
        check_enabled(user, &output)?;
        info!("Entered enable mode");
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        self.channel.write_all(line.as_bytes())?;
        self.channel.write_all(b"\n")?;
        self.channel.flush()?;
        Ok(())
    }

    fn read_until_prompt(&mut self, command: &str) -> Result<String, SessionError> {
        let output = self.read_until(at_prompt)?;
        prompt_output(command, output)
    }

    /// Read output until `done` accepts it or the timeout runs out
    fn read_until(&mut self, done: impl Fn(&str) -> bool) -> Result<String, SessionError> {
        let deadline = Instant::now() + self.timeout;
        let mut output = String::new();
        let mut buffer = [0u8; 4096];

        while Instant::now() < deadline {
            match self.channel.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    output.push_str(&String::from_utf8_lossy(&buffer[..n]));
                    if done(&output) {
                        break;
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(output)
    }
}

impl CommandSink for SshSession {
    fn send_block(&mut self, block: &CommandBlock) -> Result<BlockOutcome, SessionError> {
        for line in &block.lines {
            let output = self.exec(line)?;
            if let Some(message) = rejection(&output) {
                return Ok(BlockOutcome::Rejected {
                    command: line.clone(),
                    message,
                });
            }
        }
        Ok(BlockOutcome::Accepted)
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        info!("Disconnecting");
        if let Err(e) = self.channel.send_eof().and_then(|_| self.channel.close()) {
            warn!("Failed to close SSH channel cleanly: {}", e);
        }
        let _ = self.session.disconnect(None, "netpush done", None);
    }
}

/// Output of a command, which must end at the CLI prompt.
/// A read that timed out mid-output would leave the rest for the next command.
fn prompt_output(command: &str, output: String) -> Result<String, SessionError> {
    if at_prompt(&output) {
        Ok(output)
    } else {
        Err(SessionError::NoPrompt {
            command: command.to_string(),
        })
    }
}

/// `enable` succeeded only when the device is now at a `#` prompt
fn check_enabled(user: &str, output: &str) -> Result<(), SessionError> {
    if at_privileged_prompt(output) {
        Ok(())
    } else {
        warn!("enable refused: {}", output.trim());
        Err(SessionError::Auth {
            user: format!("{} (enable)", user),
        })
    }
}

/// Password auth first, keyboard-interactive as fallback
fn authenticate(session: &Session, user: &str, password: &str) -> Result<(), SessionError> {
    if session.userauth_password(user, password).is_ok() && session.authenticated() {
        return Ok(());
    }

    let mut prompter = PasswordPrompt {
        password: password.to_string(),
    };
    let _ = session.userauth_keyboard_interactive(user, &mut prompter);

    if session.authenticated() {
        Ok(())
    } else {
        Err(SessionError::Auth {
            user: user.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn target(port: u16) -> DeviceTarget {
        DeviceTarget {
            host: "127.0.0.1".to_string(),
            port,
            username: "admin".to_string(),
            password: "hunter2".to_string(),
            enable_secret: None,
            timeout: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_output_without_prompt_is_incomplete() {
        let output = "vlan 10\r\nSwitch(config-vlan)#".to_string();
        assert_eq!(prompt_output("vlan 10", output.clone()).unwrap(), output);

        let partial = "show running-config\r\nBuilding configuration...".to_string();
        assert!(matches!(
            prompt_output("show running-config", partial),
            Err(SessionError::NoPrompt { ref command }) if command == "show running-config"
        ));
        assert!(matches!(
            prompt_output("vlan 10", String::new()),
            Err(SessionError::NoPrompt { .. })
        ));
    }

    #[test]
    fn test_enable_requires_privileged_prompt() {
        check_enabled("admin", "Password: \r\nSwitch#").unwrap();

        let denied = "Password: \r\n% Access denied\r\n\r\nSwitch>";
        let err = check_enabled("admin", denied).unwrap_err();
        assert!(matches!(err, SessionError::Auth { ref user } if user == "admin (enable)"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut t = target(22);
        t.enable_secret = Some("enablesecret".to_string());
        let shown = format!("{:?}", t);
        assert!(shown.contains("127.0.0.1"));
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("enablesecret"));
    }

    #[test]
    fn test_connection_refused_is_connect_error() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = SshSession::connect(&target(port));
        assert!(matches!(result, Err(SessionError::Connect { .. })));
    }

    #[test]
    fn test_unresolvable_host() {
        let mut t = target(22);
        t.host = "host.invalid".to_string();
        assert!(matches!(
            SshSession::connect(&t),
            Err(SessionError::Connect { .. }) | Err(SessionError::Resolve { .. })
        ));
    }
}
