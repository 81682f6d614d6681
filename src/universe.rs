//! Seed universe: the fixed SET symbol list with reference prices.
//!
//! Seed values are the fallback when no snapshot exists; the store
//! overlays persisted data on top of them at startup.

use crate::types::Quote;

/// The fixed subset behind the dashboard's quick-refresh control.
pub const QUICK_REFRESH_SYMBOLS: &[&str] =
    &["HMPRO", "INTUCH", "IRPC", "IVL", "JAS", "JMART"];

/// How many holdings the advisory analysis summarises.
pub const ANALYSIS_TOP_N: usize = 5;

fn seed(
    symbol: &str,
    full_name: &str,
    sector: &str,
    price: f64,
    prev_close: f64,
    change_percent: f64,
    volume: &str,
    market_cap: &str,
) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        full_name: full_name.to_string(),
        sector: sector.to_string(),
        price,
        prev_close,
        change: price - prev_close,
        change_percent,
        volume: volume.to_string(),
        market_cap: market_cap.to_string(),
        is_real_time: false,
        last_updated: None,
    }
}

/// The full tracked universe in display order.
pub fn seed_quotes() -> Vec<Quote> {
    vec![
        seed("ADVANC", "Advanced Info Service", "ICT", 294.00, 292.00, 0.68, "5.5M", "874B"),
        seed("AOT", "Airports of Thailand", "Transportation", 58.75, 59.50, -1.26, "12M", "839B"),
        seed("AWC", "Asset World Corp", "Property", 3.86, 3.82, 1.05, "45M", "123B"),
        seed("BANPU", "Banpu", "Energy", 5.55, 5.60, -0.89, "22M", "55B"),
        seed("BBL", "Bangkok Bank", "Banking", 154.50, 153.00, 0.98, "4.2M", "295B"),
        seed("BDMS", "Bangkok Dusit Medical Services", "Health Care", 26.25, 26.50, -0.94, "18M", "417B"),
        seed("BEM", "Bangkok Expressway and Metro", "Transportation", 8.05, 8.10, -0.62, "15M", "123B"),
        seed("BGRIM", "B.Grimm Power", "Energy", 21.40, 21.10, 1.42, "6.5M", "56B"),
        seed("BH", "Bumrungrad Hospital", "Health Care", 272.00, 268.00, 1.49, "1.5M", "216B"),
        seed("BJC", "Berli Jucker", "Commerce", 24.30, 24.10, 0.83, "3.2M", "97B"),
        seed("BTS", "BTS Group Holdings", "Transportation", 4.52, 4.56, -0.88, "55M", "59B"),
        seed("CBG", "Carabao Group", "Food & Beverage", 73.25, 72.00, 1.74, "2.8M", "73B"),
        seed("CENTEL", "Central Plaza Hotel", "Tourism", 36.75, 37.00, -0.68, "2.5M", "49B"),
        seed("COM7", "Com7", "Commerce", 24.10, 23.80, 1.26, "11M", "57B"),
        seed("CPALL", "CP ALL", "Commerce", 65.75, 65.00, 1.15, "18M", "591B"),
        seed("CPF", "Charoen Pokphand Foods", "Food & Beverage", 24.10, 23.90, 0.84, "15M", "198B"),
        seed("CPN", "Central Pattana", "Property", 68.50, 67.75, 1.11, "5.2M", "307B"),
        seed("CRC", "Central Retail Corporation", "Commerce", 32.75, 32.50, 0.77, "8.1M", "197B"),
        seed("DELTA", "Delta Electronics (Thailand)", "Electronic", 168.50, 165.00, 2.12, "15.2M", "2.10T"),
        seed("EA", "Energy Absolute", "Energy", 7.80, 7.95, -1.89, "120M", "29B"),
        seed("EGCO", "Electricity Generating", "Energy", 111.50, 112.00, -0.45, "0.4M", "59B"),
        seed("GLOBAL", "Siam Global House", "Commerce", 14.90, 15.00, -0.67, "5.5M", "74B"),
        seed("GPSC", "Global Power Synergy", "Energy", 42.50, 42.75, -0.58, "6.2M", "120B"),
        seed("GULF", "Gulf Energy Development", "Energy", 68.75, 68.00, 1.10, "9.5M", "807B"),
        seed("HMPRO", "Home Product Center", "Commerce", 10.10, 10.20, -0.98, "22M", "133B"),
        seed("INTUCH", "Intouch Holdings", "ICT", 114.50, 112.00, 2.23, "4.8M", "367B"),
        seed("IRPC", "IRPC", "Energy", 1.49, 1.51, -1.32, "95M", "30B"),
        seed("IVL", "Indorama Ventures", "Petrochemicals", 23.60, 23.80, -0.84, "12M", "132B"),
        seed("JAS", "Jasmine International", "ICT", 2.32, 2.34, -0.85, "52M", "19B"),
        seed("JMART", "Jaymart Group Holdings", "Commerce", 13.90, 14.00, -0.71, "9.2M", "20B"),
        seed("JMT", "JMT Network Services", "Finance", 17.60, 18.00, -2.22, "14M", "26B"),
        seed("KBANK", "Kasikornbank", "Banking", 154.50, 153.00, 0.98, "5.1M", "366B"),
        seed("KCE", "KCE Electronics", "Electronic", 33.50, 33.75, -0.74, "6.2M", "40B"),
        seed("KKP", "Kiatnakin Phatra Bank", "Banking", 51.50, 51.75, -0.48, "2.1M", "43B"),
        seed("KTB", "Krung Thai Bank", "Banking", 20.40, 20.20, 0.99, "25M", "285B"),
        seed("KTC", "Krungthai Card", "Finance", 44.50, 44.75, -0.56, "3.5M", "115B"),
        seed("LH", "Land and Houses", "Property", 6.00, 6.05, -0.83, "32M", "72B"),
        seed("MINT", "Minor International", "Tourism", 28.50, 28.75, -0.87, "10M", "161B"),
        seed("MTC", "Muangthai Capital", "Finance", 49.25, 48.75, 1.03, "5.1M", "104B"),
        seed("OR", "PTT Oil and Retail Business", "Energy", 15.90, 16.10, -1.24, "14M", "191B"),
        seed("OSP", "Osotspa", "Food & Beverage", 21.90, 22.10, -0.90, "6.8M", "66B"),
        seed("PTT", "PTT", "Energy", 33.75, 34.00, -0.74, "18.5M", "964B"),
        seed("PTTEP", "PTT Exploration and Production", "Energy", 131.50, 133.00, -1.13, "8.2M", "522B"),
        seed("PTTGC", "PTT Global Chemical", "Petrochemicals", 27.00, 27.50, -1.82, "11M", "122B"),
        seed("RATCH", "Ratch Group", "Energy", 30.75, 31.00, -0.81, "2.8M", "67B"),
        seed("SAWAD", "Srisawad Corporation", "Finance", 37.75, 38.00, -0.66, "5.2M", "51B"),
        seed("SCB", "SCB X", "Banking", 117.50, 116.00, 1.29, "8.5M", "395B"),
        seed("SCC", "Siam Cement", "Construction", 214.00, 217.00, -1.38, "1.5M", "257B"),
        seed("SCGP", "SCG Packaging", "Packaging", 25.50, 26.00, -1.92, "6.2M", "109B"),
        seed("TISCO", "Tisco Financial Group", "Banking", 99.25, 99.00, 0.25, "1.8M", "79B"),
        seed("TOP", "Thai Oil", "Energy", 48.25, 48.75, -1.03, "6.8M", "107B"),
        seed("TRUE", "True Corporation", "ICT", 12.40, 12.20, 1.64, "52M", "429B"),
        seed("TTB", "TMBThanachart Bank", "Banking", 1.94, 1.92, 1.04, "185M", "188B"),
        seed("TU", "Thai Union Group", "Food & Beverage", 14.30, 14.50, -1.38, "12M", "67B"),
        seed("WHA", "WHA Corporation", "Property", 5.90, 5.85, 0.85, "42M", "88B"),
    ]
}
