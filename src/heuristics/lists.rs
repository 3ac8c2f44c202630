//! Compiled-in defaults. Every list can be replaced through
//! [`EngineConfig`](crate::EngineConfig).

use phf::phf_set;

pub static DISPOSABLE_DOMAINS: phf::Set<&'static str> = phf_set! {
    "tempmail.com", "temp-mail.org", "temp-mail.io", "10minutemail.com",
    "10minutemail.net", "guerrillamail.com", "guerrillamail.net",
    "guerrillamail.org", "sharklasers.com", "grr.la", "mailinator.com",
    "mailinator.net", "maildrop.cc", "yopmail.com", "yopmail.fr",
    "yopmail.net", "trashmail.com", "trashmail.de", "throwawaymail.com",
    "getnada.com", "dispostable.com", "fakeinbox.com", "mintemail.com",
    "mohmal.com", "emailondeck.com", "tempail.com", "tempr.email",
    "discard.email", "mailnesia.com", "spamgourmet.com", "burnermail.io",
    "moakt.com", "mytemp.email", "tempinbox.com", "getairmail.com",
    "33mail.com", "mailcatch.com", "spam4.me", "inboxkitten.com",
    "harakirimail.com",
};

pub static ROLE_PREFIXES: phf::Set<&'static str> = phf_set! {
    "admin", "administrator", "abuse", "billing", "contact", "compliance",
    "dev", "devnull", "help", "helpdesk", "hello", "hostmaster", "hr",
    "info", "it", "jobs", "legal", "mail", "mailer-daemon", "marketing",
    "media", "news", "newsletter", "no-reply", "noreply", "office",
    "ops", "postmaster", "press", "privacy", "root", "sales", "security",
    "service", "support", "sysadmin", "team", "webmaster", "www",
};

/// Ordered: the typo suggester resolves score ties to the earliest entry.
pub static COMMON_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "icloud.com",
    "aol.com",
    "live.com",
    "msn.com",
    "protonmail.com",
    "proton.me",
    "gmx.com",
    "gmx.de",
    "mail.com",
    "zoho.com",
    "yandex.com",
    "yandex.ru",
    "mail.ru",
    "comcast.net",
    "verizon.net",
    "att.net",
    "me.com",
    "mac.com",
    "googlemail.com",
    "yahoo.co.uk",
    "hotmail.co.uk",
    "orange.fr",
    "free.fr",
    "laposte.net",
    "web.de",
    "t-online.de",
];

/// Domains known to be operated as spam traps or honeypots.
pub static SPAM_TRAP_DOMAINS: phf::Set<&'static str> = phf_set! {
    "spamtrap.io", "spam-trap.net", "honeypot.email", "trapmail.net",
    "abuse-trap.org", "spamcop-trap.net", "blackhole.email",
    "mailtrap-honeypot.com",
};

/// Matched against the full lower-cased address.
pub static BLACKLIST_PATTERNS: &[&str] = &[
    r"^(spam|spamtrap|trap|honeypot|abuse-report)[._+-]?[a-z0-9]*@",
    r"@([a-z0-9-]+\.)*(example|invalid|test|localhost)$",
    r"^(test|asdf|qwerty|foo|fake)[0-9]*@",
    r"^[^@]*\.{2,}[^@]*@",
];
