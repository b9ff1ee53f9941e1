//! Static port tables: service labels and advisory notes.

struct ServiceEntry {
    port: u16,
    name: &'static str,
}

const SERVICES: &[ServiceEntry] = &[
    ServiceEntry { port: 21, name: "FTP" },
    ServiceEntry { port: 22, name: "SSH" },
    ServiceEntry { port: 23, name: "Telnet" },
    ServiceEntry { port: 80, name: "HTTP" },
    ServiceEntry { port: 443, name: "HTTPS" },
    ServiceEntry { port: 445, name: "SMB" },
    ServiceEntry { port: 3306, name: "MySQL" },
    ServiceEntry { port: 3389, name: "RDP" },
];

struct Advisory {
    port: u16,
    note: &'static str,
}

/// Checked in this order; notes appear in the result in the same order.
const ADVISORIES: &[Advisory] = &[
    Advisory {
        port: 3306,
        note: "MySQL port exposed - check for weak credentials",
    },
    Advisory {
        port: 445,
        note: "SMB port exposed - check for EternalBlue vulnerability",
    },
    Advisory {
        port: 3389,
        note: "RDP port exposed - check for BlueKeep vulnerability",
    },
    Advisory {
        port: 21,
        note: "FTP port exposed - check for anonymous access",
    },
];

/// Service label for `port`, `Unknown-{port}` when not in the table.
pub fn service_name(port: u16) -> String {
    SERVICES
        .iter()
        .find(|e| e.port == port)
        .map_or_else(|| format!("Unknown-{port}"), |e| e.name.to_string())
}

/// Advisory notes triggered by the open `ports`.
pub fn advisories(ports: &[u16]) -> Vec<String> {
    ADVISORIES
        .iter()
        .filter(|a| ports.contains(&a.port))
        .map(|a| a.note.to_string())
        .collect()
}
