//! Well-known mail providers.

use std::fmt;

/// Default servers of a known provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderServers {
    /// SMTP host (implicit TLS on 465).
    pub smtp_host: &'static str,
    /// POP3 host (implicit TLS on 995).
    pub pop3_host: &'static str,
}

/// Mail provider detected from an address domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// QQ Mail.
    Qq,
    /// NetEase 163.
    Netease163,
    /// NetEase 126.
    Netease126,
    /// Sina Mail.
    Sina,
    /// Gmail.
    Gmail,
    /// NetEase yeah.net.
    Yeah,
    /// Anything else; servers must be entered manually.
    Custom,
}

impl Provider {
    /// All providers, in detection order.
    pub const ALL: [Self; 7] = [
        Self::Qq,
        Self::Netease163,
        Self::Netease126,
        Self::Sina,
        Self::Gmail,
        Self::Yeah,
        Self::Custom,
    ];

    /// Detects the provider by substring match on the address's domain.
    ///
    /// Addresses without `@` are custom.
    #[must_use]
    pub fn detect(email: &str) -> Self {
        let Some((_, domain)) = email.rsplit_once('@') else {
            return Self::Custom;
        };
        let domain = domain.to_lowercase();

        if domain.contains("qq.com") {
            Self::Qq
        } else if domain.contains("163.com") {
            Self::Netease163
        } else if domain.contains("126.com") {
            Self::Netease126
        } else if domain.contains("sina.com") || domain.contains("sina.cn") {
            Self::Sina
        } else if domain.contains("gmail.com") {
            Self::Gmail
        } else if domain.contains("yeah.net") {
            Self::Yeah
        } else {
            Self::Custom
        }
    }

    /// Short tag used in configuration and output.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Qq => "qq",
            Self::Netease163 => "163",
            Self::Netease126 => "126",
            Self::Sina => "sina",
            Self::Gmail => "gmail",
            Self::Yeah => "yeah",
            Self::Custom => "custom",
        }
    }

    /// Looks a provider up by tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.tag() == tag)
    }

    /// Default servers, or `None` for custom providers.
    #[must_use]
    pub const fn servers(self) -> Option<ProviderServers> {
        let (smtp_host, pop3_host) = match self {
            Self::Qq => ("smtp.qq.com", "pop.qq.com"),
            Self::Netease163 => ("smtp.163.com", "pop.163.com"),
            Self::Netease126 => ("smtp.126.com", "pop.126.com"),
            Self::Sina => ("smtp.sina.com", "pop.sina.com"),
            Self::Gmail => ("smtp.gmail.com", "pop.gmail.com"),
            Self::Yeah => ("smtp.yeah.net", "pop.yeah.net"),
            Self::Custom => return None,
        };
        Some(ProviderServers {
            smtp_host,
            pop3_host,
        })
    }
}

impl Provider {
    /// Finds the known provider whose default SMTP or POP3 host is `host`.
    #[must_use]
    pub fn serving(host: &str) -> Option<Self> {
        let host = host.trim();
        Self::ALL.into_iter().find(|provider| {
            provider.servers().is_some_and(|servers| {
                servers.smtp_host.eq_ignore_ascii_case(host)
                    || servers.pop3_host.eq_ignore_ascii_case(host)
            })
        })
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_domains() {
        assert_eq!(Provider::detect("user@qq.com"), Provider::Qq);
        assert_eq!(Provider::detect("user@vip.qq.com"), Provider::Qq);
        assert_eq!(Provider::detect("user@163.com"), Provider::Netease163);
        assert_eq!(Provider::detect("user@126.com"), Provider::Netease126);
        assert_eq!(Provider::detect("user@sina.com"), Provider::Sina);
        assert_eq!(Provider::detect("user@sina.cn"), Provider::Sina);
        assert_eq!(Provider::detect("user@GMAIL.com"), Provider::Gmail);
        assert_eq!(Provider::detect("user@yeah.net"), Provider::Yeah);
    }

    #[test]
    fn unknown_and_malformed_are_custom() {
        assert_eq!(Provider::detect("user@unknownhost.net"), Provider::Custom);
        assert_eq!(Provider::detect("qq.com"), Provider::Custom);
        assert_eq!(Provider::detect(""), Provider::Custom);
        assert!(Provider::Custom.servers().is_none());
    }

    #[test]
    fn server_table() {
        let expected = [
            (Provider::Qq, "smtp.qq.com", "pop.qq.com"),
            (Provider::Netease163, "smtp.163.com", "pop.163.com"),
            (Provider::Netease126, "smtp.126.com", "pop.126.com"),
            (Provider::Sina, "smtp.sina.com", "pop.sina.com"),
            (Provider::Gmail, "smtp.gmail.com", "pop.gmail.com"),
            (Provider::Yeah, "smtp.yeah.net", "pop.yeah.net"),
        ];
        for (provider, smtp, pop3) in expected {
            let servers = provider.servers();
            assert_eq!(
                servers,
                Some(ProviderServers {
                    smtp_host: smtp,
                    pop3_host: pop3
                })
            );
        }
    }

    #[test]
    fn hosts_map_back_to_providers() {
        assert_eq!(Provider::serving("smtp.qq.com"), Some(Provider::Qq));
        assert_eq!(Provider::serving("POP.163.com"), Some(Provider::Netease163));
        assert_eq!(Provider::serving("mail.example.org"), None);
        assert_eq!(Provider::serving(""), None);
    }

    #[test]
    fn tags_round_trip() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_tag(provider.tag()), Some(provider));
            assert_eq!(provider.to_string(), provider.tag());
        }
        assert_eq!(Provider::from_tag("outlook"), None);
    }
}
