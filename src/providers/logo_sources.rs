//! Maps a symbol to the places its logo may be found.

use crate::core::LogoRequest;

/// Favicon services, tried in order. The DuckDuckGo prefix takes `<domain>.ico`.
pub const DEFAULT_LOGO_SOURCES: [&str; 3] = [
    "https://www.google.com/s2/favicons?sz=128&domain=",
    "https://logo.clearbit.com/",
    "https://icons.duckduckgo.com/ip3/",
];

const COINGECKO_IMAGES: &str = "https://assets.coingecko.com/coins/images/";

// Base asset -> CoinGecko image path
const CRYPTO_ICONS: &[(&str, &str)] = &[
    ("BTC", "1/large/bitcoin.png"),
    ("ETH", "279/large/ethereum.png"),
    ("BNB", "825/large/bnb-icon2_2x.png"),
    ("XRP", "44/large/xrp-symbol-white-128.png"),
    ("ADA", "975/large/cardano.png"),
    ("DOGE", "5/large/dogecoin.png"),
    ("SOL", "4128/large/solana.png"),
    ("DOT", "12171/large/polkadot.png"),
    ("MATIC", "4713/large/matic-token-icon.png"),
    ("LTC", "2/large/litecoin.png"),
    ("SHIB", "11939/large/shiba.png"),
    ("TRX", "1094/large/tron-logo.png"),
    ("AVAX", "12559/large/Avalanche_Circle_RedWhite_Trans.png"),
    ("LINK", "877/large/chainlink-new-logo.png"),
    ("ATOM", "1481/large/cosmos_hub.png"),
    ("UNI", "12504/large/uniswap-uni.png"),
    ("XLM", "100/large/Stellar_symbol_black_RGB.png"),
    ("ALGO", "4380/large/download.png"),
    ("VET", "1167/large/VeChain-Logo-768x725.png"),
    ("FIL", "12817/large/filecoin.png"),
    ("ICP", "14495/large/Internet_Computer_logo.png"),
    ("AAVE", "12645/large/AAVE.png"),
    ("EOS", "738/large/eos-eos-logo.png"),
    ("XTZ", "976/large/Tezos-logo.png"),
    ("XMR", "69/large/monero_logo.png"),
    ("PEPE", "29850/large/pepe-token.jpeg"),
    ("ARB", "16547/large/photo_2023-03-29_21.47.00.jpeg"),
    ("OP", "25244/large/Optimism.png"),
    ("APT", "26455/large/aptos_round.png"),
    ("NEAR", "10365/large/near.jpg"),
    ("SUI", "26375/large/sui_asset.jpeg"),
];

const TICKER_DOMAINS: &[(&str, &str)] = &[
    ("AAPL", "apple.com"),
    ("GOOGL", "google.com"),
    ("GOOG", "google.com"),
    ("MSFT", "microsoft.com"),
    ("AMZN", "amazon.com"),
    ("META", "meta.com"),
    ("TSLA", "tesla.com"),
    ("NVDA", "nvidia.com"),
    ("AMD", "amd.com"),
    ("INTC", "intel.com"),
    ("NFLX", "netflix.com"),
    ("DIS", "disney.com"),
    ("PYPL", "paypal.com"),
    ("ADBE", "adobe.com"),
    ("CRM", "salesforce.com"),
    ("ORCL", "oracle.com"),
    ("IBM", "ibm.com"),
    ("CSCO", "cisco.com"),
    ("QCOM", "qualcomm.com"),
    ("TXN", "ti.com"),
    ("AVGO", "broadcom.com"),
    ("SHOP", "shopify.com"),
    ("SQ", "squareup.com"),
    ("UBER", "uber.com"),
    ("LYFT", "lyft.com"),
    ("SNAP", "snap.com"),
    ("TWTR", "twitter.com"),
    ("PINS", "pinterest.com"),
    ("ZM", "zoom.us"),
    ("DOCU", "docusign.com"),
    ("SPOT", "spotify.com"),
    ("ROKU", "roku.com"),
    ("V", "visa.com"),
    ("MA", "mastercard.com"),
    ("JPM", "jpmorganchase.com"),
    ("BAC", "bankofamerica.com"),
    ("WFC", "wellsfargo.com"),
    ("GS", "goldmansachs.com"),
    ("MS", "morganstanley.com"),
    ("C", "citigroup.com"),
    ("AXP", "americanexpress.com"),
    ("BLK", "blackrock.com"),
    ("SCHW", "schwab.com"),
    ("WMT", "walmart.com"),
    ("TGT", "target.com"),
    ("COST", "costco.com"),
    ("HD", "homedepot.com"),
    ("LOW", "lowes.com"),
    ("NKE", "nike.com"),
    ("SBUX", "starbucks.com"),
    ("MCD", "mcdonalds.com"),
    ("KO", "coca-cola.com"),
    ("PEP", "pepsi.com"),
    ("PG", "pg.com"),
    ("JNJ", "jnj.com"),
    ("PFE", "pfizer.com"),
    ("MRNA", "modernatx.com"),
    ("UNH", "unitedhealthgroup.com"),
    ("CVS", "cvs.com"),
    ("WBA", "walgreens.com"),
    ("ABBV", "abbvie.com"),
    ("LLY", "lilly.com"),
    ("TMO", "thermofisher.com"),
    ("DHR", "danaher.com"),
    ("ABT", "abbott.com"),
    ("BMY", "bms.com"),
    ("AMGN", "amgen.com"),
    ("GILD", "gilead.com"),
    ("BIIB", "biogen.com"),
    ("REGN", "regeneron.com"),
    ("VRTX", "vrtx.com"),
    ("ZTS", "zoetis.com"),
    ("BA", "boeing.com"),
    ("LMT", "lockheedmartin.com"),
    ("RTX", "rtx.com"),
    ("NOC", "northropgrumman.com"),
    ("GD", "gd.com"),
    ("CAT", "caterpillar.com"),
    ("DE", "deere.com"),
    ("MMM", "3m.com"),
    ("HON", "honeywell.com"),
    ("GE", "ge.com"),
    ("UPS", "ups.com"),
    ("FDX", "fedex.com"),
    ("F", "ford.com"),
    ("GM", "gm.com"),
    ("TM", "toyota.com"),
    ("HMC", "honda.com"),
    ("XOM", "exxonmobil.com"),
    ("CVX", "chevron.com"),
    ("COP", "conocophillips.com"),
    ("OXY", "oxy.com"),
    ("SLB", "slb.com"),
    ("T", "att.com"),
    ("VZ", "verizon.com"),
    ("TMUS", "t-mobile.com"),
    ("CMCSA", "comcast.com"),
    ("CHTR", "charter.com"),
    ("NEE", "nexteraenergy.com"),
    ("DUK", "duke-energy.com"),
    ("SO", "southerncompany.com"),
    ("D", "dominionenergy.com"),
    ("AEP", "aep.com"),
    ("SPY", "ssga.com"),
    ("QQQ", "invesco.com"),
    ("IWM", "ishares.com"),
    ("DIA", "ssga.com"),
    ("VOO", "vanguard.com"),
    ("VTI", "vanguard.com"),
    ("BRK.A", "berkshirehathaway.com"),
    ("BRK.B", "berkshirehathaway.com"),
    ("PLTR", "palantir.com"),
    ("SNOW", "snowflake.com"),
    ("DDOG", "datadoghq.com"),
    ("NET", "cloudflare.com"),
    ("CRWD", "crowdstrike.com"),
    ("ZS", "zscaler.com"),
    ("OKTA", "okta.com"),
    ("TWLO", "twilio.com"),
    ("MDB", "mongodb.com"),
    ("ESTC", "elastic.co"),
    ("SPLK", "splunk.com"),
    ("NOW", "servicenow.com"),
    ("WDAY", "workday.com"),
    ("TEAM", "atlassian.com"),
    ("VEEV", "veeva.com"),
    ("PANW", "paloaltonetworks.com"),
    ("FTNT", "fortinet.com"),
    ("COIN", "coinbase.com"),
    ("HOOD", "robinhood.com"),
    ("ABNB", "airbnb.com"),
    ("DASH", "doordash.com"),
    ("RBLX", "roblox.com"),
    ("U", "unity.com"),
    ("EA", "ea.com"),
    ("ATVI", "activision.com"),
    ("TTWO", "take2games.com"),
    ("SE", "sea.com"),
    ("BABA", "alibaba.com"),
    ("JD", "jd.com"),
    ("PDD", "pinduoduo.com"),
    ("BIDU", "baidu.com"),
    ("NIO", "nio.com"),
    ("XPEV", "xiaopeng.com"),
    ("LI", "lixiang.com"),
    ("TSM", "tsmc.com"),
    ("ASML", "asml.com"),
    ("SAP", "sap.com"),
    ("SONY", "sony.com"),
    ("SNE", "sony.com"),
    ("NVS", "novartis.com"),
    ("AZN", "astrazeneca.com"),
    ("GSK", "gsk.com"),
    ("SNY", "sanofi.com"),
    ("NVO", "novonordisk.com"),
    ("SHEL", "shell.com"),
    ("BP", "bp.com"),
    ("TTE", "totalenergies.com"),
    ("RIVN", "rivian.com"),
    ("LCID", "lucidmotors.com"),
    ("IBIT", "blackrock.com"),
    ("GBTC", "grayscale.com"),
    ("BITO", "proshares.com"),
    ("OBTC", "ospreyfunds.io"),
    ("FBTC", "fidelity.com"),
    ("ARKB", "ark-funds.com"),
    ("BITB", "bitwiseinvestments.com"),
    ("HODL", "vaneck.com"),
    ("BTCW", "wisdomtree.com"),
    ("EZBC", "franklintempleton.com"),
    ("BTCO", "invesco.com"),
    ("DEFI", "hashdex.com"),
    ("CI", "cigna.com"),
    ("HUM", "humana.com"),
    ("ANTM", "anthem.com"),
    ("ELV", "elevancehealth.com"),
    ("HCA", "hcahealthcare.com"),
    ("CNC", "centene.com"),
    ("MOH", "molinahealthcare.com"),
];

const CORPORATE_SUFFIXES: &[&str] = &[
    "incorporated",
    "corporation",
    "enterprises",
    "enterprise",
    "holdings",
    "holding",
    "company",
    "limited",
    "group",
    "corp",
    "inc",
    "ltd",
    "llc",
    "plc",
    "co",
];

/// Resolves a [`LogoRequest`] from the symbol and, failing that, the company name.
#[derive(Debug, Clone)]
pub struct LogoSourcePolicy {
    sources: Vec<String>,
}

impl Default for LogoSourcePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LOGO_SOURCES.iter().map(|s| s.to_string()).collect())
    }
}

impl LogoSourcePolicy {
    pub fn new(sources: Vec<String>) -> Self {
        Self { sources }
    }

    pub fn resolve(&self, symbol: &str, company_name: Option<&str>) -> LogoRequest {
        let base = symbol.strip_suffix("-USD").unwrap_or(symbol);
        if let Some((_, image)) = CRYPTO_ICONS.iter().find(|(asset, _)| *asset == base) {
            return LogoRequest::Direct {
                sources: vec![format!("{COINGECKO_IMAGES}{image}")],
            };
        }

        let domain = TICKER_DOMAINS
            .iter()
            .find(|(ticker, _)| *ticker == symbol)
            .map(|(_, domain)| domain.to_string())
            .or_else(|| company_name.and_then(domain_from_name));

        match domain {
            Some(domain) => LogoRequest::Templated {
                domain,
                sources: self.sources.clone(),
            },
            None => LogoRequest::Absent,
        }
    }
}

/// Guesses `<name>.com` from a company name, e.g. "Rivian Automotive, Inc." -> "rivianautomotive.com".
fn domain_from_name(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    let mut trimmed = lower.trim();
    for suffix in CORPORATE_SUFFIXES {
        let Some(rest) = trimmed
            .strip_suffix('.')
            .unwrap_or(trimmed)
            .strip_suffix(suffix)
        else {
            continue;
        };
        // Only whole words count: "Costco" must not lose its "co".
        if rest.is_empty() || rest.ends_with([' ', ',']) {
            trimmed = rest.trim_end_matches([' ', ',']);
            break;
        }
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    (cleaned.len() > 2).then(|| format!("{cleaned}.com"))
}
