use regex::Regex;
use std::{
    io::Read,
    net::Ipv4Addr,
    process::{Command as StdCommand, Stdio},
    sync::LazyLock,
    thread,
    time::{Duration, Instant},
};

use crate::{
    config::ExecutorConfig,
    executor::{ExecutorError, NodeExecutor, ProbePolicy, TracePolicy},
};

const ADDRESS_DEADLINE: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

static INET_ADDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"inet (?:addr:)?(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").expect("valid regex")
});

/// Runs diagnostics through `sh -c`, using the configured command templates.
pub struct ShellExecutor {
    templates: ExecutorConfig,
}

impl ShellExecutor {
    pub fn new(templates: ExecutorConfig) -> Self {
        Self { templates }
    }

    fn command(&self, template: &str, node: usize, extra: &[(&str, String)]) -> String {
        let container = render(&self.templates.container, &[("node", node.to_string())]);
        let mut vars = vec![("node", node.to_string()), ("container", container)];
        vars.extend(extra.iter().cloned());
        render(template, &vars)
    }
}

impl NodeExecutor for ShellExecutor {
    fn resolve_ip(&self, node: usize) -> Result<Ipv4Addr, ExecutorError> {
        let cmd = self.command(&self.templates.address, node, &[]);
        let output = run(&cmd, ADDRESS_DEADLINE)?;
        parse_first_address(&output).ok_or(ExecutorError::NoAddress(node))
    }

    fn probe_rtt(
        &self,
        node: usize,
        target: Ipv4Addr,
        policy: &ProbePolicy,
    ) -> Result<String, ExecutorError> {
        let cmd = self.command(
            &self.templates.ping,
            node,
            &[
                ("ip", target.to_string()),
                ("count", policy.attempts.to_string()),
                ("timeout", policy.timeout.as_secs().max(1).to_string()),
                ("spacing", format!("{:.1}", policy.spacing.as_secs_f64())),
            ],
        );
        run(&cmd, policy.deadline())
    }

    fn trace_path(
        &self,
        node: usize,
        target: Ipv4Addr,
        policy: &TracePolicy,
    ) -> Result<String, ExecutorError> {
        let cmd = self.command(
            &self.templates.traceroute,
            node,
            &[
                ("ip", target.to_string()),
                ("max_hops", policy.max_hops.to_string()),
                ("wait", policy.wait.as_secs().max(1).to_string()),
            ],
        );
        run(&cmd, policy.deadline())
    }
}

/// Runs a shell command and collects its stdout, killing it past `deadline`.
pub fn run(cmd: &str, deadline: Duration) -> Result<String, ExecutorError> {
    log::debug!("Executing shell command: {}", cmd);

    let mut child = StdCommand::new("sh")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let stdout = child.stdout.take();
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout {
            let _ = out.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    });

    let started = Instant::now();
    loop {
        match child.try_wait()? {
            Some(status) => {
                log::debug!(
                    "Command exited with code {}: {}",
                    status.code().unwrap_or(-1),
                    cmd
                );
                break;
            }
            None if started.elapsed() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecutorError::Timeout {
                    cmd: cmd.to_string(),
                    after: deadline,
                });
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    }

    Ok(reader.join().unwrap_or_default())
}

fn render(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

/// First non-loopback IPv4 address in `ip addr` / `ifconfig` style output.
pub fn parse_first_address(output: &str) -> Option<Ipv4Addr> {
    INET_ADDR
        .captures_iter(output)
        .filter_map(|c| c[1].parse::<Ipv4Addr>().ok())
        .find(|ip| !ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_substitute_every_placeholder() {
        let executor = ShellExecutor::new(ExecutorConfig::default());
        let cmd = executor.command(
            &executor.templates.ping,
            7,
            &[
                ("ip", "9.1.7.50".into()),
                ("count", "3".into()),
                ("timeout", "3".into()),
                ("spacing", "0.2".into()),
            ],
        );
        assert_eq!(
            cmd,
            "docker exec ovs_container_7 ping -c 3 -W 3 -i 0.2 9.1.7.50"
        );
    }

    #[test]
    fn first_address_skips_loopback() {
        let output = "\
1: lo    inet 127.0.0.1/8 scope host lo
14: B1-eth5    inet 9.1.1.50/24 brd 9.1.1.255 scope global B1-eth5
15: B1-eth2    inet 10.0.1.40/24 brd 10.0.1.255 scope global B1-eth2
";
        assert_eq!(parse_first_address(output), Some(Ipv4Addr::new(9, 1, 1, 50)));
    }

    #[test]
    fn legacy_ifconfig_output() {
        let output = "eth0      Link encap:Ethernet\n          inet addr:10.0.3.30  Bcast:10.0.3.255";
        assert_eq!(parse_first_address(output), Some(Ipv4Addr::new(10, 0, 3, 30)));
    }

    #[test]
    fn no_address() {
        assert_eq!(parse_first_address("lo: inet 127.0.0.1"), None);
    }

    #[test]
    fn run_collects_stdout() {
        let out = run("echo 64 bytes", Duration::from_secs(5)).unwrap();
        assert_eq!(out.trim(), "64 bytes");
    }

    #[test]
    fn run_kills_past_deadline() {
        let started = Instant::now();
        let err = run("sleep 5", Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, ExecutorError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
