//! Parser for `df -h` output, scoped to a single mount point

use regex::Regex;

use crate::model::MountUsage;

/// Scans df output for the line whose mount point equals `mount`
///
/// Returns `None` when the mount is absent — the caller treats an absent
/// mount as a distinct failure mode, not a parse error.
#[must_use]
pub fn parse_mount_usage(text: &str, mount: &str) -> Option<MountUsage> {
    let pattern = format!(
        r"^(?P<fs>\S+)\s+(?P<size>\S+)\s+(?P<used>\S+)\s+(?P<avail>\S+)\s+(?P<usep>\d+)%\s+(?P<mount>{})\s*$",
        regex::escape(mount)
    );
    // The pattern is built from a fixed template plus an escaped literal,
    // so compilation cannot fail on any mount string.
    let line_re = Regex::new(&pattern).ok()?;

    text.lines().find_map(|line| {
        let captures = line_re.captures(line.trim())?;
        Some(MountUsage {
            filesystem: captures["fs"].to_string(),
            size: captures["size"].to_string(),
            used: captures["used"].to_string(),
            avail: captures["avail"].to_string(),
            use_percent: captures["usep"].parse().ok()?,
            mount: captures["mount"].to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
 10:30:01 up 212 days,  4:17,  1 user,  load average: 0.08, 0.06, 0.01
Filesystem               Size  Used Avail Use% Mounted on
devtmpfs                 7.8G     0  7.8G   0% /dev
/dev/mapper/rhel-root     50G   21G   30G  42% /
/dev/sda1               1014M  934M   81M  92% /boot
tmpfs                    1.6G     0  1.6G   0% /run/user/0
";

    #[test]
    fn test_finds_target_mount() {
        let usage = parse_mount_usage(OUTPUT, "/boot").unwrap();
        assert_eq!(usage.filesystem, "/dev/sda1");
        assert_eq!(usage.size, "1014M");
        assert_eq!(usage.used, "934M");
        assert_eq!(usage.avail, "81M");
        assert_eq!(usage.use_percent, 92);
        assert_eq!(usage.mount, "/boot");
    }

    #[test]
    fn test_mount_match_is_exact() {
        // "/" must not match the "/boot" or "/dev" lines.
        let usage = parse_mount_usage(OUTPUT, "/").unwrap();
        assert_eq!(usage.filesystem, "/dev/mapper/rhel-root");
        assert_eq!(usage.use_percent, 42);
    }

    #[test]
    fn test_absent_mount_is_none() {
        assert!(parse_mount_usage(OUTPUT, "/var/log").is_none());
        assert!(parse_mount_usage("", "/boot").is_none());
    }
}
