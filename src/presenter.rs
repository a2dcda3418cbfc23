use serde::Serialize;

use crate::types::{HostResult, OsGuess, PortResult, ResultModel};

/// Display tree for one host. Built fresh from a [`ResultModel`]; never mutates it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct HostView {
    /// "ip / state"
    pub heading: String,
    pub sections: Vec<Section>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    Protocol { name: String, ports: Vec<String> },
    OsDetection { guesses: Vec<String> },
    Vulnerabilities { items: Vec<String> },
}

/// Project a result into display nodes, one per host, in backend order.
///
/// OS and vulnerability sections appear only when present and non-empty.
pub fn present(model: &ResultModel) -> Vec<HostView> {
    model.hosts.iter().map(host_view).collect()
}

fn host_view(host: &HostResult) -> HostView {
    let mut sections: Vec<Section> = host
        .protocols
        .iter()
        .map(|proto| Section::Protocol {
            name: proto.name.clone(),
            ports: proto.ports.iter().map(port_line).collect(),
        })
        .collect();

    if let Some(guesses) = host.os_detections.as_deref().filter(|g| !g.is_empty()) {
        sections.push(Section::OsDetection {
            guesses: guesses.iter().map(os_line).collect(),
        });
    }
    if let Some(vulns) = host.vulnerabilities.as_deref().filter(|v| !v.is_empty()) {
        sections.push(Section::Vulnerabilities {
            items: vulns.to_vec(),
        });
    }

    HostView {
        heading: format!("{} / {}", host.ip, host.state),
        sections,
    }
}

/// "Port 22 open | Service: ssh (OpenSSH 8.9)". The version only ever follows a service.
/// Empty strings count as missing; nmap reports unidentified services as `""`.
pub fn port_line(port: &PortResult) -> String {
    let mut line = format!("Port {} {}", port.port, port.state);
    if let Some(service) = non_empty(&port.service) {
        line.push_str(" | Service: ");
        line.push_str(service);
        if let Some(version) = non_empty(&port.version) {
            line.push_str(&format!(" ({version})"));
        }
    }
    line
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

pub fn os_line(guess: &OsGuess) -> String {
    format!("{} (Accuracy: {}%)", guess.name, guess.accuracy)
}

/// Flatten the display tree into indented text lines for a terminal.
pub fn render_lines(views: &[HostView]) -> Vec<String> {
    let mut out = Vec::new();
    for view in views {
        out.push(format!("Host: {}", view.heading));
        for section in &view.sections {
            match section {
                Section::Protocol { name, ports } => {
                    out.push(format!("  Protocol: {name}"));
                    out.extend(ports.iter().map(|p| format!("    {p}")));
                }
                Section::OsDetection { guesses } => {
                    out.push("  OS Detection".to_string());
                    out.extend(guesses.iter().map(|g| format!("    {g}")));
                }
                Section::Vulnerabilities { items } => {
                    out.push("  Vulnerabilities".to_string());
                    out.extend(items.iter().map(|v| format!("    - {v}")));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProtocolResult;

    fn port(n: u16, service: Option<&str>, version: Option<&str>) -> PortResult {
        PortResult {
            port: n,
            state: "open".into(),
            service: service.map(Into::into),
            version: version.map(Into::into),
        }
    }

    #[test]
    fn port_line_variants() {
        assert_eq!(port_line(&port(22, None, None)), "Port 22 open");
        assert_eq!(port_line(&port(22, Some("ssh"), None)), "Port 22 open | Service: ssh");
        assert_eq!(
            port_line(&port(22, Some("ssh"), Some("OpenSSH 8.9"))),
            "Port 22 open | Service: ssh (OpenSSH 8.9)"
        );
        // a version without a service is never shown
        assert_eq!(port_line(&port(22, None, Some("OpenSSH 8.9"))), "Port 22 open");
    }

    #[test]
    fn empty_service_and_version_are_hidden() {
        assert_eq!(port_line(&port(8081, Some(""), None)), "Port 8081 open");
        assert_eq!(port_line(&port(8081, Some(""), Some("1.0"))), "Port 8081 open");
        assert_eq!(port_line(&port(22, Some("ssh"), Some(""))), "Port 22 open | Service: ssh");

        let body = r#"{"hosts":[{"ip":"h","state":"up","protocols":[
            {"name":"tcp","ports":[{"port":8081,"state":"open","service":""}]}]}]}"#;
        let model = ResultModel::from_json(body).unwrap();
        assert_eq!(
            render_lines(&present(&model)),
            vec!["Host: h / up", "  Protocol: tcp", "    Port 8081 open"]
        );
    }

    #[test]
    fn empty_optional_lists_emit_nothing() {
        let model = ResultModel {
            target: None,
            hosts: vec![HostResult {
                ip: "10.0.0.1".into(),
                state: "up".into(),
                protocols: vec![],
                os_detections: Some(vec![]),
                vulnerabilities: Some(vec![]),
            }],
        };
        let views = present(&model);
        assert_eq!(views[0].heading, "10.0.0.1 / up");
        assert!(views[0].sections.is_empty());
    }

    #[test]
    fn sections_follow_protocols_then_os_then_vulns() {
        let model = ResultModel {
            target: None,
            hosts: vec![HostResult {
                ip: "h".into(),
                state: "up".into(),
                protocols: vec![
                    ProtocolResult { name: "udp".into(), ports: vec![port(53, Some("domain"), None)] },
                    ProtocolResult { name: "tcp".into(), ports: vec![port(80, Some("http"), Some("nginx"))] },
                ],
                os_detections: Some(vec![OsGuess { name: "Linux 5.4".into(), accuracy: 98 }]),
                vulnerabilities: Some(vec!["CVE-2021-0001".into()]),
            }],
        };
        let lines = render_lines(&present(&model));
        assert_eq!(
            lines,
            vec![
                "Host: h / up",
                "  Protocol: udp",
                "    Port 53 open | Service: domain",
                "  Protocol: tcp",
                "    Port 80 open | Service: http (nginx)",
                "  OS Detection",
                "    Linux 5.4 (Accuracy: 98%)",
                "  Vulnerabilities",
                "    - CVE-2021-0001",
            ]
        );
    }
}
