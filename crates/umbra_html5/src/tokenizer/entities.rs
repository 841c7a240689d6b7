use phf::phf_map;

/// Windows-1252 repair mappings for numeric references into the C1 control
/// range
pub static TOKEN_REPLACEMENTS: phf::Map<u32, char> = phf_map! {
    0x80_u32 => '\u{20AC}',
    0x82_u32 => '\u{201A}',
    0x83_u32 => '\u{0192}',
    0x84_u32 => '\u{201E}',
    0x85_u32 => '\u{2026}',
    0x86_u32 => '\u{2020}',
    0x87_u32 => '\u{2021}',
    0x88_u32 => '\u{02C6}',
    0x89_u32 => '\u{2030}',
    0x8A_u32 => '\u{0160}',
    0x8B_u32 => '\u{2039}',
    0x8C_u32 => '\u{0152}',
    0x8E_u32 => '\u{017D}',
    0x91_u32 => '\u{2018}',
    0x92_u32 => '\u{2019}',
    0x93_u32 => '\u{201C}',
    0x94_u32 => '\u{201D}',
    0x95_u32 => '\u{2022}',
    0x96_u32 => '\u{2013}',
    0x97_u32 => '\u{2014}',
    0x98_u32 => '\u{02DC}',
    0x99_u32 => '\u{2122}',
    0x9A_u32 => '\u{0161}',
    0x9B_u32 => '\u{203A}',
    0x9C_u32 => '\u{0153}',
    0x9E_u32 => '\u{017E}',
    0x9F_u32 => '\u{0178}',
};

/// Named character references. Keys are stored as they appear after the
/// ampersand; legacy names that may omit the trailing semicolon are present
/// in both forms. Matching is longest-prefix over this table.
pub static TOKEN_NAMED_CHARS: phf::Map<&'static str, &'static str> = phf_map! {
    "AElig;" => "\u{00C6}",
    "AMP" => "&",
    "AMP;" => "&",
    "Aacute;" => "\u{00C1}",
    "Acirc;" => "\u{00C2}",
    "Agrave;" => "\u{00C0}",
    "Alpha;" => "\u{0391}",
    "Aring;" => "\u{00C5}",
    "Atilde;" => "\u{00C3}",
    "Auml;" => "\u{00C4}",
    "Beta;" => "\u{0392}",
    "COPY" => "\u{00A9}",
    "COPY;" => "\u{00A9}",
    "Ccedil;" => "\u{00C7}",
    "Chi;" => "\u{03A7}",
    "Dagger;" => "\u{2021}",
    "Delta;" => "\u{0394}",
    "ETH;" => "\u{00D0}",
    "Eacute;" => "\u{00C9}",
    "Ecirc;" => "\u{00CA}",
    "Egrave;" => "\u{00C8}",
    "Epsilon;" => "\u{0395}",
    "Eta;" => "\u{0397}",
    "Euml;" => "\u{00CB}",
    "GT" => ">",
    "GT;" => ">",
    "Gamma;" => "\u{0393}",
    "Iacute;" => "\u{00CD}",
    "Icirc;" => "\u{00CE}",
    "Igrave;" => "\u{00CC}",
    "Iota;" => "\u{0399}",
    "Iuml;" => "\u{00CF}",
    "Kappa;" => "\u{039A}",
    "LT" => "<",
    "LT;" => "<",
    "Lambda;" => "\u{039B}",
    "Mu;" => "\u{039C}",
    "Ntilde;" => "\u{00D1}",
    "Nu;" => "\u{039D}",
    "OElig;" => "\u{0152}",
    "Oacute;" => "\u{00D3}",
    "Ocirc;" => "\u{00D4}",
    "Ograve;" => "\u{00D2}",
    "Omega;" => "\u{03A9}",
    "Omicron;" => "\u{039F}",
    "Oslash;" => "\u{00D8}",
    "Otilde;" => "\u{00D5}",
    "Ouml;" => "\u{00D6}",
    "Phi;" => "\u{03A6}",
    "Pi;" => "\u{03A0}",
    "Prime;" => "\u{2033}",
    "Psi;" => "\u{03A8}",
    "QUOT" => "\"",
    "QUOT;" => "\"",
    "REG" => "\u{00AE}",
    "REG;" => "\u{00AE}",
    "Rho;" => "\u{03A1}",
    "Scaron;" => "\u{0160}",
    "Sigma;" => "\u{03A3}",
    "THORN;" => "\u{00DE}",
    "Tau;" => "\u{03A4}",
    "Theta;" => "\u{0398}",
    "Uacute;" => "\u{00DA}",
    "Ucirc;" => "\u{00DB}",
    "Ugrave;" => "\u{00D9}",
    "Upsilon;" => "\u{03A5}",
    "Uuml;" => "\u{00DC}",
    "Xi;" => "\u{039E}",
    "Yacute;" => "\u{00DD}",
    "Yuml;" => "\u{0178}",
    "Zeta;" => "\u{0396}",
    "aacute;" => "\u{00E1}",
    "acirc;" => "\u{00E2}",
    "acute" => "\u{00B4}",
    "acute;" => "\u{00B4}",
    "aelig;" => "\u{00E6}",
    "agrave;" => "\u{00E0}",
    "alpha;" => "\u{03B1}",
    "amp" => "&",
    "amp;" => "&",
    "and;" => "\u{2227}",
    "ang;" => "\u{2220}",
    "apos;" => "'",
    "aring;" => "\u{00E5}",
    "asymp;" => "\u{2248}",
    "ast;" => "*",
    "atilde;" => "\u{00E3}",
    "auml;" => "\u{00E4}",
    "bdquo;" => "\u{201E}",
    "beta;" => "\u{03B2}",
    "brvbar" => "\u{00A6}",
    "brvbar;" => "\u{00A6}",
    "bull;" => "\u{2022}",
    "cap;" => "\u{2229}",
    "ccedil;" => "\u{00E7}",
    "cedil" => "\u{00B8}",
    "cedil;" => "\u{00B8}",
    "cent" => "\u{00A2}",
    "cent;" => "\u{00A2}",
    "chi;" => "\u{03C7}",
    "circ;" => "\u{02C6}",
    "colon;" => ":",
    "comma;" => ",",
    "commat;" => "@",
    "cong;" => "\u{2245}",
    "copy" => "\u{00A9}",
    "copy;" => "\u{00A9}",
    "crarr;" => "\u{21B5}",
    "cup;" => "\u{222A}",
    "curren" => "\u{00A4}",
    "curren;" => "\u{00A4}",
    "dagger;" => "\u{2020}",
    "darr;" => "\u{2193}",
    "deg" => "\u{00B0}",
    "deg;" => "\u{00B0}",
    "delta;" => "\u{03B4}",
    "divide" => "\u{00F7}",
    "divide;" => "\u{00F7}",
    "dollar;" => "$",
    "eacute;" => "\u{00E9}",
    "ecirc;" => "\u{00EA}",
    "egrave;" => "\u{00E8}",
    "empty;" => "\u{2205}",
    "emsp;" => "\u{2003}",
    "ensp;" => "\u{2002}",
    "epsilon;" => "\u{03B5}",
    "equals;" => "=",
    "equiv;" => "\u{2261}",
    "eta;" => "\u{03B7}",
    "eth;" => "\u{00F0}",
    "euml;" => "\u{00EB}",
    "euro;" => "\u{20AC}",
    "excl;" => "!",
    "exist;" => "\u{2203}",
    "fnof;" => "\u{0192}",
    "forall;" => "\u{2200}",
    "frac12" => "\u{00BD}",
    "frac12;" => "\u{00BD}",
    "frac14" => "\u{00BC}",
    "frac14;" => "\u{00BC}",
    "frac34" => "\u{00BE}",
    "frac34;" => "\u{00BE}",
    "gamma;" => "\u{03B3}",
    "ge;" => "\u{2265}",
    "gt" => ">",
    "gt;" => ">",
    "harr;" => "\u{2194}",
    "hearts;" => "\u{2665}",
    "hellip;" => "\u{2026}",
    "iacute;" => "\u{00ED}",
    "icirc;" => "\u{00EE}",
    "iexcl" => "\u{00A1}",
    "iexcl;" => "\u{00A1}",
    "igrave;" => "\u{00EC}",
    "infin;" => "\u{221E}",
    "int;" => "\u{222B}",
    "iota;" => "\u{03B9}",
    "iquest" => "\u{00BF}",
    "iquest;" => "\u{00BF}",
    "isin;" => "\u{2208}",
    "iuml;" => "\u{00EF}",
    "kappa;" => "\u{03BA}",
    "lambda;" => "\u{03BB}",
    "laquo" => "\u{00AB}",
    "laquo;" => "\u{00AB}",
    "larr;" => "\u{2190}",
    "lceil;" => "\u{2308}",
    "ldquo;" => "\u{201C}",
    "le;" => "\u{2264}",
    "lfloor;" => "\u{230A}",
    "lowast;" => "\u{2217}",
    "lsaquo;" => "\u{2039}",
    "lsquo;" => "\u{2018}",
    "lt" => "<",
    "lt;" => "<",
    "macr" => "\u{00AF}",
    "macr;" => "\u{00AF}",
    "mdash;" => "\u{2014}",
    "micro" => "\u{00B5}",
    "micro;" => "\u{00B5}",
    "middot" => "\u{00B7}",
    "middot;" => "\u{00B7}",
    "minus;" => "\u{2212}",
    "mu;" => "\u{03BC}",
    "nabla;" => "\u{2207}",
    "nbsp" => "\u{00A0}",
    "nbsp;" => "\u{00A0}",
    "ndash;" => "\u{2013}",
    "ne;" => "\u{2260}",
    "ni;" => "\u{220B}",
    "not" => "\u{00AC}",
    "not;" => "\u{00AC}",
    "notin;" => "\u{2209}",
    "nsub;" => "\u{2284}",
    "ntilde;" => "\u{00F1}",
    "nu;" => "\u{03BD}",
    "num;" => "#",
    "oacute;" => "\u{00F3}",
    "ocirc;" => "\u{00F4}",
    "oelig;" => "\u{0153}",
    "ograve;" => "\u{00F2}",
    "oline;" => "\u{203E}",
    "omega;" => "\u{03C9}",
    "omicron;" => "\u{03BF}",
    "oplus;" => "\u{2295}",
    "or;" => "\u{2228}",
    "ordf" => "\u{00AA}",
    "ordf;" => "\u{00AA}",
    "ordm" => "\u{00BA}",
    "ordm;" => "\u{00BA}",
    "oslash;" => "\u{00F8}",
    "otilde;" => "\u{00F5}",
    "otimes;" => "\u{2297}",
    "ouml;" => "\u{00F6}",
    "para" => "\u{00B6}",
    "para;" => "\u{00B6}",
    "part;" => "\u{2202}",
    "percnt;" => "%",
    "period;" => ".",
    "permil;" => "\u{2030}",
    "perp;" => "\u{22A5}",
    "phi;" => "\u{03C6}",
    "pi;" => "\u{03C0}",
    "piv;" => "\u{03D6}",
    "plus;" => "+",
    "plusmn" => "\u{00B1}",
    "plusmn;" => "\u{00B1}",
    "pound" => "\u{00A3}",
    "pound;" => "\u{00A3}",
    "prime;" => "\u{2032}",
    "prod;" => "\u{220F}",
    "prop;" => "\u{221D}",
    "psi;" => "\u{03C8}",
    "quest;" => "?",
    "quot" => "\"",
    "quot;" => "\"",
    "radic;" => "\u{221A}",
    "raquo" => "\u{00BB}",
    "raquo;" => "\u{00BB}",
    "rarr;" => "\u{2192}",
    "rceil;" => "\u{2309}",
    "rdquo;" => "\u{201D}",
    "reg" => "\u{00AE}",
    "reg;" => "\u{00AE}",
    "rfloor;" => "\u{230B}",
    "rho;" => "\u{03C1}",
    "rsaquo;" => "\u{203A}",
    "rsquo;" => "\u{2019}",
    "sbquo;" => "\u{201A}",
    "scaron;" => "\u{0161}",
    "sdot;" => "\u{22C5}",
    "sect" => "\u{00A7}",
    "sect;" => "\u{00A7}",
    "semi;" => ";",
    "shy" => "\u{00AD}",
    "shy;" => "\u{00AD}",
    "sigma;" => "\u{03C3}",
    "sigmaf;" => "\u{03C2}",
    "sim;" => "\u{223C}",
    "sol;" => "/",
    "spades;" => "\u{2660}",
    "sub;" => "\u{2282}",
    "sube;" => "\u{2286}",
    "sum;" => "\u{2211}",
    "sup1" => "\u{00B9}",
    "sup1;" => "\u{00B9}",
    "sup2" => "\u{00B2}",
    "sup2;" => "\u{00B2}",
    "sup3" => "\u{00B3}",
    "sup3;" => "\u{00B3}",
    "sup;" => "\u{2283}",
    "supe;" => "\u{2287}",
    "szlig;" => "\u{00DF}",
    "tau;" => "\u{03C4}",
    "there4;" => "\u{2234}",
    "theta;" => "\u{03B8}",
    "thinsp;" => "\u{2009}",
    "thorn;" => "\u{00FE}",
    "tilde;" => "\u{02DC}",
    "times" => "\u{00D7}",
    "times;" => "\u{00D7}",
    "trade;" => "\u{2122}",
    "uacute;" => "\u{00FA}",
    "uarr;" => "\u{2191}",
    "ucirc;" => "\u{00FB}",
    "ugrave;" => "\u{00F9}",
    "uml" => "\u{00A8}",
    "uml;" => "\u{00A8}",
    "upsilon;" => "\u{03C5}",
    "uuml;" => "\u{00FC}",
    "xi;" => "\u{03BE}",
    "yacute;" => "\u{00FD}",
    "yen" => "\u{00A5}",
    "yen;" => "\u{00A5}",
    "yuml;" => "\u{00FF}",
    "zeta;" => "\u{03B6}",
    "zwj;" => "\u{200D}",
    "zwnj;" => "\u{200C}",
};
