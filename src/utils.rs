use lazy_static::lazy_static;
use regex::Regex;

// Remove spaces and uppercase an IBAN as typed by a user
pub fn normalize_iban(iban: &str) -> String {
    iban.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

// Validate an IBAN: shape, then ISO 7064 mod-97 checksum
pub fn validate_iban(iban: &str) -> bool {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z0-9]{11,30}$").unwrap();
    }

    let iban = normalize_iban(iban);
    if !RE.is_match(&iban) {
        return false;
    }

    let (head, tail) = iban.split_at(4);
    let remainder = tail.chars().chain(head.chars()).fold(0u32, |acc, c| {
        // letters count as two digits: A = 10 ... Z = 35
        match c.to_digit(36) {
            Some(v) if v >= 10 => (acc * 100 + v) % 97,
            Some(v) => (acc * 10 + v) % 97,
            None => acc,
        }
    });
    remainder == 1
}

// Shorten an address for display: 0x5aAe…BeAed
pub fn shorten_address(address: &str) -> String {
    let chars = address.chars().count();
    if chars <= 12 {
        return address.to_string();
    }
    let head: String = address.chars().take(6).collect();
    let tail: String = address.chars().skip(chars - 5).collect();
    format!("{}…{}", head, tail)
}
