use iab_consent::consent::Consent;
use std::env::args;
use std::str::FromStr;

fn main() {
    let s = args()
        .nth(1)
        .unwrap_or_else(|| "BOQ6ZEAOQ6ZEAABACDENAOwAAAAHCACgACAAQABA".to_string());

    let consent = Consent::from_str(&s).expect("a valid consent string");

    #[cfg(feature = "serde")]
    println!("{}", serde_json::to_string_pretty(&consent).unwrap());
}
