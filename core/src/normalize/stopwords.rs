use super::Normalizer;
use crate::language::Language;
use std::collections::HashSet;

/// Drops dictionary words; tokens are split on whitespace and rejoined with single spaces.
pub struct StopwordRemover {
    words: HashSet<&'static str>,
}

impl StopwordRemover {
    pub fn new(language: Language) -> Self {
        Self { words: words(language).iter().copied().collect() }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.words.contains(token)
    }
}

impl Normalizer for StopwordRemover {
    fn apply_to(&self, text: &str) -> String {
        text.split_whitespace()
            .filter(|token| !self.is_stopword(token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub(crate) fn words(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => ENGLISH,
        Language::Spanish => SPANISH,
        Language::Portuguese => PORTUGUESE,
        Language::French => FRENCH,
        Language::Italian => ITALIAN,
        Language::German => GERMAN,
    }
}

const ENGLISH: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","can't","cannot","could","couldn't",
    "did","didn't","do","does","doesn't","doing","don't","down","during",
    "each","few","for","from","further",
    "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
    "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
    "let's","me","more","most","mustn't","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
    "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
    "under","until","up","very",
    "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
    "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves",
];

const SPANISH: &[&str] = &[
    "de","la","que","el","en","y","a","los","del","se","las","por","un","para","con","no","una","su","al","lo",
    "como","más","pero","sus","le","ya","o","este","sí","porque","esta","entre","cuando","muy","sin","sobre",
    "también","me","hasta","hay","donde","quien","desde","todo","nos","durante","todos","uno","les","ni",
    "contra","otros","ese","eso","ante","ellos","e","esto","mí","antes","algunos","qué","unos","yo","otro",
    "otras","otra","él","tanto","esa","estos","mucho","quienes","nada","muchos","cual","poco","ella","estar",
    "estas","algunas","algo","nosotros","mi","mis","tú","te","ti","tu","tus","ellas","nosotras","vosotros",
    "vosotras","os","mío","mía","míos","mías","tuyo","tuya","tuyos","tuyas","suyo","suya","suyos","suyas",
    "nuestro","nuestra","nuestros","nuestras","vuestro","vuestra","vuestros","vuestras","esos","esas",
    "estoy","estás","está","estamos","estáis","están","esté","estés","estemos","estéis","estén","estaré",
    "estarás","estará","estaremos","estaréis","estarán","estaba","estabas","estábamos","estaban","estuve",
    "estuvo","estuvimos","estuvieron","he","has","ha","hemos","habéis","han","haya","hayas","hayamos",
    "hayan","habré","habrá","habían","había","habías","hube","hubo","hubieron","soy","eres","es","somos",
    "sois","son","sea","seas","seamos","sean","seré","será","seremos","serán","era","eras","éramos","eran",
    "fui","fue","fuimos","fueron","fuera","fueras","fuese","tengo","tienes","tiene","tenemos","tenéis",
    "tienen","tenga","tengan","tendré","tendrá","tenía","tenían","tuve","tuvo","tuvieron","tenido","teniendo",
    "estado","estada","estados","estadas","estando","habido","habiendo","sido","siendo",
];

const PORTUGUESE: &[&str] = &[
    "de","a","o","que","e","do","da","em","um","para","com","não","uma","os","no","se","na","por","mais",
    "as","dos","como","mas","ao","ele","das","à","seu","sua","ou","quando","muito","nos","já","eu",
    "também","só","pelo","pela","até","isso","ela","entre","depois","sem","mesmo","aos","seus","quem",
    "nas","me","esse","eles","você","essa","num","nem","suas","meu","às","minha","numa","pelos","elas",
    "qual","nós","lhe","deles","essas","esses","pelas","este","dele","tu","te","vocês","vos","lhes",
    "meus","minhas","teu","tua","teus","tuas","nosso","nossa","nossos","nossas","dela","delas","esta",
    "estes","estas","aquele","aquela","aqueles","aquelas","isto","aquilo","estou","está","estamos",
    "estão","estive","esteve","estivemos","estiveram","estava","estávamos","estavam","hei","há","havemos",
    "hão","houve","houvemos","houveram","sou","somos","são","era","éramos","eram","fui","foi","fomos",
    "foram","seja","sejam","ser","tenho","tem","temos","têm","tinha","tínhamos","tinham","tive","teve",
    "tivemos","tiveram","ter",
];

const FRENCH: &[&str] = &[
    "au","aux","avec","ce","ces","dans","de","des","du","elle","en","et","eux","il","ils","je","la","le",
    "les","leur","lui","ma","mais","me","même","mes","moi","mon","ne","nos","notre","nous","on","ou","par",
    "pas","pour","qu","que","qui","sa","se","ses","son","sur","ta","te","tes","toi","ton","tu","un","une",
    "vos","votre","vous","c","d","j","l","à","m","n","s","t","y","été","étée","étées","étés","étant",
    "suis","es","est","sommes","êtes","sont","serai","seras","sera","serons","serez","seront","serais",
    "serait","étais","était","étions","étiez","étaient","fus","fut","fûmes","furent","sois","soit",
    "soyons","soyez","soient","ai","as","avons","avez","ont","aurai","aura","aurons","aurez","auront",
    "aurais","aurait","avais","avait","avions","aviez","avaient","eut","eûmes","eurent","aie","aies",
    "ait","ayons","ayez","aient","ceci","cela","celà","cet","cette","ici","leurs","quel",
    "quels","quelle","quelles","sans","soi",
];

const ITALIAN: &[&str] = &[
    "ad","al","allo","ai","agli","all","agl","alla","alle","con","col","coi","da","dal","dallo","dai",
    "dagli","dall","dagl","dalla","dalle","di","del","dello","dei","degli","dell","degl","della","delle",
    "in","nel","nello","nei","negli","nell","negl","nella","nelle","su","sul","sullo","sui","sugli",
    "sull","sugl","sulla","sulle","per","tra","contro","io","tu","lui","lei","noi","voi","loro","mio",
    "mia","miei","mie","tuo","tua","tuoi","tue","suo","sua","suoi","sue","nostro","nostra","nostri",
    "nostre","vostro","vostra","vostri","vostre","mi","ti","ci","vi","lo","la","li","le","gli","ne",
    "il","un","uno","una","ma","ed","se","perché","anche","come","dov","dove","che","chi","cui","non",
    "più","quale","quanto","quanti","quanta","quante","quello","quelli","quella","quelle","questo",
    "questi","questa","queste","si","tutto","tutti","a","c","e","i","l","o","ho","hai","ha","abbiamo",
    "avete","hanno","abbia","avevo","aveva","avevano","sono","sei","è","siamo","siete","sia","ero",
    "era","erano","fui","fu","furono","sarò","sarà","saranno","sarei","sarebbe","stato","essendo",
];

const GERMAN: &[&str] = &[
    "aber","alle","allem","allen","aller","alles","als","also","am","an","ander","andere","anderem",
    "anderen","anderer","anderes","auch","auf","aus","bei","bin","bis","bist","da","damit","dann","der",
    "den","des","dem","die","das","dass","daß","derselbe","dieselbe","dasselbe","dazu","dein","deine",
    "deinem","deinen","deiner","denn","dich","dir","du","dies","diese","diesem","diesen","dieser","dieses",
    "doch","dort","durch","ein","eine","einem","einen","einer","eines","einig","einige","er","ihn","ihm",
    "es","etwas","euer","eure","für","gegen","gewesen","hab","habe","haben","hat","hatte","hatten","hier",
    "hin","hinter","ich","mich","mir","ihr","ihre","ihrem","ihren","ihrer","ihres","euch","im","in",
    "indem","ins","ist","jede","jedem","jeden","jeder","jedes","jene","jetzt","kann","kein","keine",
    "können","könnte","machen","man","manche","mein","meine","mit","muss","musste","nach","nicht","nichts",
    "noch","nun","nur","ob","oder","ohne","sehr","sein","seine","selbst","sich","sie","ihnen","sind","so",
    "solche","soll","sollte","sondern","sonst","über","um","und","uns","unser","unter","viel","vom","von",
    "vor","während","war","waren","warst","was","weg","weil","weiter","welche","wenn","werde","werden",
    "wie","wieder","will","wir","wird","wirst","wo","wollen","wollte","würde","würden","zu","zum","zur",
    "zwar","zwischen",
];
