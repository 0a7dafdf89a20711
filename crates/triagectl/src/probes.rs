//! Linux fact sources, expressed as ranked strategy lists
//!
//! Each function returns strategies most precise first. Parsing is kept in
//! plain functions so it can be tested without the files or tools present.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::Duration;

use sysinfo::{Disks, System};
use triage_common::{
    CpuLoadFact, DiskFact, FactError, FirewallFact, GatewayFact, MemoryFact, Strategy,
};

const PROC_STAT: &str = "/proc/stat";
const PROC_LOADAVG: &str = "/proc/loadavg";
const PROC_MEMINFO: &str = "/proc/meminfo";
const PROC_NET_ROUTE: &str = "/proc/net/route";

/// Interval between the two /proc/stat samples
const STAT_SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

/// Firewall services checked through systemd, in order
const FIREWALL_UNITS: [&str; 3] = ["firewalld", "ufw", "nftables"];

/// RTF_GATEWAY in /proc/net/route flags
const RTF_GATEWAY: u32 = 0x2;

fn parse_error(message: impl Into<String>, target: &str) -> FactError {
    FactError::new(message).category("Parse").target(target)
}

fn read_proc(path: &str) -> Result<String, FactError> {
    fs::read_to_string(path).map_err(|e| FactError::from(e).target(path))
}

/// Run a command and return stdout, failing on a non-zero exit
fn run_checked(program: &str, args: &[&str]) -> Result<String, FactError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| FactError::from(e).target(program))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FactError::new(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        ))
        .category("Command")
        .target(program));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ============================================================================
// CPU
// ============================================================================

pub fn cpu_strategies() -> Vec<Strategy<CpuLoadFact>> {
    vec![
        Strategy::optional("sysinfo", || {
            let mut sys = System::new();
            sys.refresh_cpu();
            thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_cpu();
            if sys.cpus().is_empty() {
                return Err(FactError::new("no CPUs reported").category("Unsupported"));
            }
            Ok(CpuLoadFact::new(sys.global_cpu_info().cpu_usage() as f64))
        }),
        Strategy::optional("proc-stat", || {
            let first = parse_proc_stat(&read_proc(PROC_STAT)?)?;
            thread::sleep(STAT_SAMPLE_INTERVAL);
            let second = parse_proc_stat(&read_proc(PROC_STAT)?)?;
            Ok::<_, FactError>(busy_percent(first, second).and_then(CpuLoadFact::new))
        }),
        Strategy::optional("loadavg", || {
            let load = parse_loadavg(&read_proc(PROC_LOADAVG)?)?;
            let cores = num_cpus::get().max(1) as f64;
            Ok::<_, FactError>(CpuLoadFact::new(load / cores * 100.0))
        }),
    ]
}

/// (idle, total) jiffies from the aggregate `cpu` line of /proc/stat
pub fn parse_proc_stat(content: &str) -> Result<(u64, u64), FactError> {
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| parse_error("no aggregate cpu line", PROC_STAT))?;

    let fields = line
        .split_whitespace()
        .skip(1)
        .map(str::parse::<u64>)
        .collect::<Result<Vec<_>, _>>()?;
    if fields.len() < 4 {
        return Err(parse_error("cpu line has too few fields", PROC_STAT));
    }
    // idle + iowait
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Ok((idle, fields.iter().sum()))
}

/// Busy share between two (idle, total) samples; `None` if no time passed
pub fn busy_percent(first: (u64, u64), second: (u64, u64)) -> Option<f64> {
    let total = second.1.checked_sub(first.1)?;
    let idle = second.0.checked_sub(first.0)?;
    if total == 0 {
        return None;
    }
    Some((total.saturating_sub(idle)) as f64 / total as f64 * 100.0)
}

/// One-minute load average
pub fn parse_loadavg(content: &str) -> Result<f64, FactError> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| parse_error("empty loadavg", PROC_LOADAVG))?;
    Ok(first.parse::<f64>()?)
}

// ============================================================================
// Memory
// ============================================================================

pub fn memory_strategies() -> Vec<Strategy<MemoryFact>> {
    vec![
        Strategy::optional("sysinfo", || {
            let mut sys = System::new();
            sys.refresh_memory();
            Ok::<_, FactError>(MemoryFact::from_bytes(sys.total_memory(), sys.available_memory()))
        }),
        Strategy::optional("proc-meminfo", || {
            let (total, available) = parse_meminfo(&read_proc(PROC_MEMINFO)?)?;
            Ok::<_, FactError>(MemoryFact::from_bytes(total, available))
        }),
    ]
}

/// (total, available) in bytes from /proc/meminfo
pub fn parse_meminfo(content: &str) -> Result<(u64, u64), FactError> {
    let field = |name: &str| -> Option<u64> {
        content
            .lines()
            .find(|l| l.starts_with(name))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|v| v.parse::<u64>().ok())
            .map(|kb| kb * 1024)
    };
    let total = field("MemTotal:")
        .ok_or_else(|| parse_error("MemTotal missing", PROC_MEMINFO))?;
    // Kernels before 3.14 have no MemAvailable
    let available = field("MemAvailable:")
        .or_else(|| field("MemFree:"))
        .ok_or_else(|| parse_error("MemAvailable missing", PROC_MEMINFO))?;
    Ok((total, available))
}

// ============================================================================
// Disk
// ============================================================================

pub fn disk_strategies(mount: &Path) -> Vec<Strategy<DiskFact>> {
    let sysinfo_mount = mount.to_path_buf();
    let df_mount = mount.to_path_buf();
    vec![
        Strategy::optional("sysinfo", move || {
            let disks = Disks::new_with_refreshed_list();
            let covering = covering_mount(
                &sysinfo_mount,
                disks.list().iter().map(|d| d.mount_point()),
            )
            .map(Path::to_path_buf);
            // Not under any listed volume; let `df` answer for it
            let Some(covering) = covering else {
                return Ok(None);
            };
            let found = disks.list().iter().find(|d| d.mount_point() == covering.as_path());
            let Some(disk) = found else {
                return Ok(None);
            };
            Ok::<_, FactError>(DiskFact::from_bytes(
                sysinfo_mount.display().to_string(),
                disk.total_space(),
                disk.available_space(),
            ))
        }),
        Strategy::optional("df", move || {
            let target = df_mount.display().to_string();
            let output = run_checked("df", &["-Pk", &target])?;
            let (total, available) = parse_df(&output)?;
            Ok::<_, FactError>(DiskFact::from_bytes(target, total, available))
        }),
    ]
}

/// The deepest mount point containing `path`
pub fn covering_mount<'a>(
    path: &Path,
    mount_points: impl IntoIterator<Item = &'a Path>,
) -> Option<&'a Path> {
    mount_points
        .into_iter()
        .filter(|mount| path.starts_with(mount))
        .max_by_key(|mount| mount.components().count())
}

/// (total, available) in bytes from `df -Pk` output
pub fn parse_df(output: &str) -> Result<(u64, u64), FactError> {
    let line = output
        .lines()
        .nth(1)
        .ok_or_else(|| parse_error("df printed no data line", "df"))?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(parse_error(format!("unexpected df line: {}", line), "df"));
    }
    let total_kb: u64 = fields[1].parse()?;
    let available_kb: u64 = fields[3].parse()?;
    Ok((total_kb * 1024, available_kb * 1024))
}

// ============================================================================
// Network
// ============================================================================

pub fn gateway_strategies() -> Vec<Strategy<GatewayFact>> {
    vec![
        Strategy::optional("proc-net-route", || parse_route_table(&read_proc(PROC_NET_ROUTE)?)),
        Strategy::optional("ip-route", || {
            let output = run_checked("ip", &["route", "show", "default"])?;
            Ok::<_, FactError>(parse_ip_route(&output))
        }),
    ]
}

/// Default gateway from /proc/net/route; `None` when there is no default route
pub fn parse_route_table(content: &str) -> Result<Option<GatewayFact>, FactError> {
    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 || fields[1] != "00000000" {
            continue;
        }
        let flags = u32::from_str_radix(fields[3], 16).unwrap_or(0);
        if flags & RTF_GATEWAY == 0 {
            continue;
        }
        let raw = u32::from_str_radix(fields[2], 16)
            .map_err(|e| parse_error(e.to_string(), PROC_NET_ROUTE))?;
        // Stored in host (little-endian) byte order
        let octets = raw.to_le_bytes();
        return Ok(Some(GatewayFact {
            address: format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]),
            interface: Some(fields[0].to_string()),
        }));
    }
    Ok(None)
}

/// Default gateway from `ip route show default`
pub fn parse_ip_route(output: &str) -> Option<GatewayFact> {
    let line = output.lines().find(|l| l.starts_with("default"))?;
    let words: Vec<&str> = line.split_whitespace().collect();
    let after = |key: &str| {
        words
            .iter()
            .position(|w| *w == key)
            .and_then(|i| words.get(i + 1))
            .map(|s| s.to_string())
    };
    Some(GatewayFact {
        address: after("via")?,
        interface: after("dev"),
    })
}

// ============================================================================
// Firewall
// ============================================================================

pub fn firewall_strategies() -> Vec<Strategy<FirewallFact>> {
    vec![
        Strategy::optional("systemd-units", || {
            for unit in FIREWALL_UNITS {
                // is-active exits non-zero for inactive units; only stdout matters
                let output = Command::new("systemctl")
                    .args(["is-active", unit])
                    .output()
                    .map_err(|e| FactError::from(e).target("systemctl"))?;
                let state = String::from_utf8_lossy(&output.stdout);
                if let Some(fact) = firewall_from_unit_state(unit, &state) {
                    return Ok(Some(fact));
                }
            }
            // No unit running says nothing about ufw rules loaded without systemd
            Ok::<_, FactError>(None)
        }),
        Strategy::optional("ufw-status", || {
            let output = run_checked("ufw", &["status"])?;
            Ok::<_, FactError>(parse_ufw_status(&output))
        }),
    ]
}

/// An enabled firewall when `unit` reports `active`
pub fn firewall_from_unit_state(unit: &str, state: &str) -> Option<FirewallFact> {
    (state.trim() == "active").then(|| FirewallFact {
        enabled: true,
        provider: unit.to_string(),
    })
}

/// Firewall state from `ufw status`
pub fn parse_ufw_status(output: &str) -> Option<FirewallFact> {
    let status = output
        .lines()
        .find_map(|l| l.trim().strip_prefix("Status:"))?
        .trim();
    Some(FirewallFact {
        enabled: status == "active",
        provider: "ufw".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proc_stat() {
        let content = "cpu  100 0 50 800 50 0 0 0 0 0\ncpu0 50 0 25 400 25 0 0 0 0 0\n";
        assert_eq!(parse_proc_stat(content).unwrap(), (850, 1000));
    }

    #[test]
    fn test_parse_proc_stat_missing_line() {
        let err = parse_proc_stat("intr 1 2 3\n").unwrap_err();
        assert_eq!(err.category_name(), Some("Parse"));
    }

    #[test]
    fn test_busy_percent() {
        assert_eq!(busy_percent((850, 1000), (1000, 1200)), Some(25.0));
        assert_eq!(busy_percent((850, 1000), (850, 1000)), None);
        assert_eq!(busy_percent((850, 1000), (10, 20)), None);
    }

    #[test]
    fn test_parse_loadavg() {
        assert_eq!(parse_loadavg("0.52 0.58 0.59 1/467 12345\n").unwrap(), 0.52);
        assert!(parse_loadavg("").is_err());
        assert_eq!(parse_loadavg("abc").unwrap_err().category_name(), Some("Parse"));
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:       16000 kB\n\
                       MemFree:         2000 kB\n\
                       MemAvailable:    8000 kB\n";
        assert_eq!(parse_meminfo(content).unwrap(), (16000 * 1024, 8000 * 1024));
    }

    #[test]
    fn test_parse_meminfo_old_kernel() {
        let content = "MemTotal:       16000 kB\nMemFree:         2000 kB\n";
        assert_eq!(parse_meminfo(content).unwrap(), (16000 * 1024, 2000 * 1024));
    }

    #[test]
    fn test_parse_df() {
        let output = "Filesystem     1024-blocks     Used Available Capacity Mounted on\n\
                      /dev/sda1        102400000 95232000   7168000      93% /\n";
        assert_eq!(parse_df(output).unwrap(), (102400000 * 1024, 7168000 * 1024));
        assert!(parse_df("Filesystem\n").is_err());
    }

    #[test]
    fn test_parse_route_table() {
        let content = "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\n\
                       eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\n\
                       eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\n";
        let gateway = parse_route_table(content).unwrap().unwrap();
        assert_eq!(gateway.address, "192.168.1.1");
        assert_eq!(gateway.interface.as_deref(), Some("eth0"));
    }

    #[test]
    fn test_parse_route_table_without_default() {
        let content = "Iface\tDestination\tGateway \tFlags\n\
                       eth0\t0001A8C0\t00000000\t0001\n";
        assert_eq!(parse_route_table(content).unwrap(), None);
    }

    #[test]
    fn test_parse_ip_route() {
        let output = "default via 10.0.0.1 dev wlan0 proto dhcp metric 600\n";
        let gateway = parse_ip_route(output).unwrap();
        assert_eq!(gateway.address, "10.0.0.1");
        assert_eq!(gateway.interface.as_deref(), Some("wlan0"));
        assert!(parse_ip_route("").is_none());
    }

    #[test]
    fn test_parse_ufw_status() {
        assert!(parse_ufw_status("Status: active\n\nTo Action From\n").unwrap().enabled);
        assert!(!parse_ufw_status("Status: inactive\n").unwrap().enabled);
        assert!(parse_ufw_status("ERROR: need root\n").is_none());
    }

    #[test]
    fn test_covering_mount_picks_deepest() {
        let mounts = [Path::new("/"), Path::new("/home"), Path::new("/boot/efi")];
        let cover = |p: &str| covering_mount(Path::new(p), mounts.iter().copied());
        assert_eq!(cover("/home/alice/projects"), Some(Path::new("/home")));
        assert_eq!(cover("/home"), Some(Path::new("/home")));
        assert_eq!(cover("/homework"), Some(Path::new("/")));
        assert_eq!(cover("/tmp/xyz"), Some(Path::new("/")));
        assert_eq!(covering_mount(Path::new("relative"), mounts.iter().copied()), None);
    }

    #[test]
    fn test_inactive_units_leave_firewall_undecided() {
        let fact = firewall_from_unit_state("ufw", "active\n").unwrap();
        assert!(fact.enabled);
        assert_eq!(fact.provider, "ufw");
        assert!(firewall_from_unit_state("firewalld", "inactive\n").is_none());
        assert!(firewall_from_unit_state("nftables", "unknown").is_none());

        let labels: Vec<_> = firewall_strategies().iter().map(|s| s.label().to_string()).collect();
        assert_eq!(labels, vec!["systemd-units", "ufw-status"]);
    }

    #[test]
    fn test_strategy_order() {
        let labels: Vec<_> = cpu_strategies().iter().map(|s| s.label().to_string()).collect();
        assert_eq!(labels, vec!["sysinfo", "proc-stat", "loadavg"]);
        let labels: Vec<_> = gateway_strategies().iter().map(|s| s.label().to_string()).collect();
        assert_eq!(labels, vec!["proc-net-route", "ip-route"]);
    }
}
