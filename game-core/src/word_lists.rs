//! Built-in four-tier corpus. A deployment can override these with a words
//! directory (see `WordPool::load_from_dir`); the lists here keep the server
//! playable out of the box.

pub const EASY: &str = "\
DOG
CAT
HOUSE
APPLE
SUN
MOON
CAR
TREE
BOOK
CHAIR
TABLE
DOOR
WINDOW
SHOE
HAT
FISH
BIRD
MILK
BREAD
WATER
FIRE
RAIN
SNOW
BED
PHONE
CLOCK
BALL
CAKE
EGG
SHIRT
KEY
PEN
PAPER
STAR
GRASS
FLOWER
HORSE
COW
PIG
DUCK
TRAIN
BUS
BOAT
PLANE
SPOON
FORK
PLATE
CUP
BANANA
ORANGE
PIZZA
CHEESE
BABY
SMILE
BEACH
RIVER
MOUNTAIN
GARDEN
SCHOOL
DOCTOR
TEACHER
FRIEND
MUSIC
ICE CREAM
";

pub const NORMAL: &str = "\
GUITAR
VOLCANO
CAMERA
LIBRARY
PENGUIN
SANDWICH
UMBRELLA
TRACTOR
DENTIST
AIRPORT
BALCONY
CACTUS
DOLPHIN
ENVELOPE
FIREWORK
GLACIER
HAMMOCK
ISLAND
JUNGLE
KANGAROO
LADDER
MAGNET
NAPKIN
OCTOPUS
PARROT
RAINBOW
SCISSORS
TELESCOPE
VACUUM
WHISTLE
YOGURT
ZIPPER
COMPASS
LANTERN
MERMAID
PYRAMID
ROBOT
SKELETON
TORNADO
UNICORN
WAFFLE
BLIZZARD
CANYON
DIAMOND
ELEVATOR
FOUNTAIN
HELMET
IGLOO
KAYAK
LIGHTHOUSE
MARATHON
NECKLACE
ORCHESTRA
PAJAMAS
QUICKSAND
SAXOPHONE
TREASURE
VIOLIN
WIZARD
ANCHOR
BLENDER
CIRCUS
SUBMARINE
HOT DOG
";

pub const HARD: &str = "\
METAPHOR
QUARANTINE
SABOTAGE
PARADOX
ALIBI
CHARISMA
DILEMMA
ECLIPSE
FORGERY
GRAVITY
HERITAGE
ILLUSION
JUSTICE
KARMA
LABYRINTH
MIRAGE
NOSTALGIA
OPTIMISM
PREJUDICE
RIDDLE
SILHOUETTE
TREASON
UTOPIA
VERTIGO
WISDOM
AMBUSH
CAMOUFLAGE
DIPLOMACY
EMPATHY
FATIGUE
GOSSIP
HYPOTHESIS
INSOMNIA
JEALOUSY
LOYALTY
MOMENTUM
NEGOTIATION
OBSESSION
PROPAGANDA
RECESSION
STAMINA
TABOO
ULTIMATUM
VENDETTA
WILDERNESS
ADRENALINE
BLACKMAIL
CONSCIENCE
ENIGMA
FOLKLORE
HORIZON
INTUITION
JARGON
KALEIDOSCOPE
LULLABY
SUSPENSE
GRUDGE
DYNASTY
EPIDEMIC
REVENGE
CURFEW
HOAX
";

pub const INSANE: &str = "\
ZEITGEIST
ONOMATOPOEIA
SERENDIPITY
JUXTAPOSITION
EPIPHANY
QUINTESSENCE
PARADIGM
ENTROPY
HUBRIS
CATHARSIS
ALGORITHM
PHOTOSYNTHESIS
PROCRASTINATION
CLAUSTROPHOBIA
DOPPELGANGER
RENAISSANCE
SCHADENFREUDE
PHILANTHROPY
AMBIVALENCE
CACOPHONY
DICHOTOMY
EUPHEMISM
HIERARCHY
IDIOSYNCRASY
KLEPTOMANIA
MALAPROPISM
NEPOTISM
OXYMORON
PLACEBO
QUANTUM
RHETORIC
SYCOPHANT
TAUTOLOGY
VERNACULAR
WANDERLUST
XENOPHOBIA
ZENITH
APOCALYPSE
BIOLUMINESCENCE
DEFENESTRATION
EQUILIBRIUM
HYPERBOLE
IMPEACHMENT
JURISPRUDENCE
METACOGNITION
NIHILISM
OBFUSCATION
PERPENDICULAR
SIMULTANEOUS
THERMODYNAMICS
UBIQUITOUS
VENTRILOQUIST
CRYPTOGRAPHY
EXISTENTIALISM
GENTRIFICATION
MITOCHONDRIA
PANDEMONIUM
";
