/// One binding call: a peptide window at `pos` in protein `name`, scored against `allele`.
///
/// Records are produced by prediction collaborators and already normalized: whatever column the
/// predictor used for its score is carried here as `score`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub peptide: String,
    /// Minimal binding motif inside `peptide`; equal to `peptide` when the predictor reports none.
    pub core: String,
    /// 0-based offset of the peptide window in the source protein.
    pub pos: usize,
    pub name: String,
    pub allele: String,
    pub score: f64,
    pub rank: Option<usize>,
}

/// Identity of a peptide window independent of the allele that scored it.
pub type SiteKey<'a> = (&'a str, usize, &'a str);

impl PredictionRecord {
    pub fn new(
        peptide: impl Into<String>,
        core: impl Into<String>,
        pos: usize,
        name: impl Into<String>,
        allele: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            peptide: peptide.into(),
            core: core.into(),
            pos,
            name: name.into(),
            allele: allele.into(),
            score,
            rank: None,
        }
    }

    /// `(peptide, pos, name)`, the key under which alleles are merged.
    pub fn site_key(&self) -> SiteKey<'_> {
        (&self.peptide, self.pos, &self.name)
    }

    pub fn peptide_length(&self) -> usize {
        self.peptide.chars().count()
    }
}

/// Anything that sits at a position along a named sequence.
pub trait Located {
    fn name(&self) -> &str;
    fn pos(&self) -> usize;
    fn peptide_length(&self) -> usize;

    fn start(&self) -> usize {
        self.pos()
    }

    /// Exclusive end of the peptide window.
    fn end(&self) -> usize {
        self.pos() + self.peptide_length()
    }
}

impl Located for PredictionRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn pos(&self) -> usize {
        self.pos
    }
    fn peptide_length(&self) -> usize {
        PredictionRecord::peptide_length(self)
    }
}
