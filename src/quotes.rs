use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;

/// The quotes every server ships with.
pub const STARTING_QUOTES: &[&str] = &[
    "Abstraction is ever present.",
    "A late night does not make any sense.",
    "A principal idea is omnipresent, much like candy.",
    "Nihilism gambles with lives, happiness, and even destiny itself!",
    "The light at the end of the tunnel is interdependent on the relatedness of motivation, subcultures, and management.",
    "Utter nonsense is a storyteller without equal.",
    "Non-locality is the driver of truth. By summoning, we vibrate.",
    "A small mercy is nothing at all?",
    "The last sentence you read is often sensible nonsense.",
    "668: The Neighbor of the Beast.",
];

/// A fixed pool of quotes plus random selection over it.
#[derive(Clone)]
pub struct QuoteBook {
    quotes: Vec<String>,
}

impl QuoteBook {
    pub fn new(quotes: Vec<String>) -> Self {
        Self { quotes }
    }

    /// Pick one quote at random.
    pub fn random(&self) -> String {
        self.quotes
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for QuoteBook {
    fn default() -> Self {
        Self::new(STARTING_QUOTES.iter().map(|q| q.to_string()).collect())
    }
}

const ADJECTIVES: &[&str] = &[
    "adept",
    "adorable",
    "alluvial",
    "ample",
    "authentic",
    "avaricious",
    "beleaguered",
    "bewitched",
    "bitter",
    "bleak",
    "blissful",
    "bogus",
    "bouncy",
    "buoyant",
    "bubbly",
    "buttery",
    "cavernous",
    "chubby",
    "cimmerian",
    "cromulent",
    "crooked",
    "delectable",
    "deplorable",
    "dilatory",
    "disingenuous",
    "dowdy",
    "droopy",
    "ellipsoidal",
    "embiggened",
    "enlightened",
    "euphoric",
    "fabulous",
    "fearless",
    "feckless",
    "flippant",
    "frivolous",
    "frosty",
    "fuzzy",
    "gargantuan",
    "gibbous",
    "ginormous",
    "grizzled",
    "grumpy",
    "gummy",
    "harmonious",
    "hasty",
    "haunting",
    "honest",
    "hortatory",
    "humble",
    "icky",
    "idle",
    "inglorious",
    "irenic",
    "itchy",
    "janky",
    "jocular",
    "jolly",
    "jovial",
    "klutzy",
    "kooky",
    "limp",
    "livid",
    "loquacious",
    "luminous",
    "lumbering",
    "majestic",
    "meaty",
    "mellow",
    "menacing",
    "mirthful",
    "munificient",
    "mushy",
    "naughty",
    "negative",
    "nerdy",
    "nippy",
    "oddball",
    "oily",
    "perky",
    "pesky",
    "piquant",
    "poised",
    "pokable",
    "posh",
    "prickly",
    "queruluos",
    "quintessential",
    "raging",
    "ravenous",
    "rhapsodic",
    "serene",
    "slippery",
    "snippy",
    "tart",
    "tasty",
    "tender",
    "thunderous",
    "trim",
    "unctuous",
    "undulating",
    "unkempt",
    "unripe",
    "velvety",
    "vengeful",
    "voluminous",
    "warlike",
    "wiry",
    "wry",
    "yummy",
    "zany",
    "zesty",
];

const FRUITS: &[&str] = &[
    "acai",
    "apple",
    "apricot",
    "banana",
    "blackberry",
    "blueberry",
    "cherry",
    "coconut",
    "cranberry",
    "date",
    "elderberry",
    "grape",
    "grapefruit",
    "jackfruit",
    "kiwi",
    "kumquat",
    "lemon",
    "lime",
    "mango",
    "mulberry",
    "nectarine",
    "orange",
    "papaya",
    "passionfruit",
    "pear",
    "persimmon",
    "plum",
    "pineapple",
    "pomegranate",
    "raspberry",
    "snozzberry",
    "strawberry",
    "tangerine",
];

/// Server ids look like "zesty-kumquat-x3f9k2qa".
pub fn generate_server_id() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quintessential");
    let fruit = FRUITS.choose(&mut rng).copied().unwrap_or("kumquat");
    let suffix: String = (0..8)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect::<String>()
        .to_lowercase();

    format!("{}-{}-{}", adjective, fruit, suffix)
}
