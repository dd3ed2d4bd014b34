/// Known SolaX Cloud API hosts. Regional deployments answer for serials
/// registered in their region only, so every host is a candidate.
pub const HOSTS: &[&str] = &[
    "www.solaxcloud.com",
    "euapi.solaxcloud.com",
    "global.solaxcloud.com",
];

pub const PORTS: &[u16] = &[9443, 443];

pub const REALTIME_PATH: &str = "/proxy/api/getRealtimeInfo.do";

pub const PATHS: &[&str] = &[REALTIME_PATH];

/// Build the ordered endpoint candidate list: the custom base URL (if any)
/// first, then the host x port x path cross product in declaration order.
/// Duplicates are dropped, keeping the first occurrence.
pub fn candidates(custom_base: Option<&str>) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    if let Some(base) = custom_base {
        let base = base.trim().trim_end_matches('/');
        if !base.is_empty() {
            urls.push(format!("{}{}", base, REALTIME_PATH));
        }
    }

    for host in HOSTS {
        for port in PORTS {
            for path in PATHS {
                let url = format!("https://{}:{}{}", host, port, path);
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }
    }

    urls
}
