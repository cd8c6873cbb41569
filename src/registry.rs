use tracing::debug;

/// One row of the static jurisdiction table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JurisdictionEntry {
    pub code: &'static str,
    pub name: &'static str,
    /// Online voter registration page used when no source supplies one
    pub default_registration_website: &'static str,
}

const fn entry(
    code: &'static str,
    name: &'static str,
    default_registration_website: &'static str,
) -> JurisdictionEntry {
    JurisdictionEntry {
        code,
        name,
        default_registration_website,
    }
}

/// The 50 states plus the District of Columbia, ordered by name.
static JURISDICTIONS: [JurisdictionEntry; 51] = [
    entry("AL", "Alabama", "https://www.alabamavotes.gov/voter-registration"),
    entry("AK", "Alaska", "https://voterregistration.alaska.gov/"),
    entry("AZ", "Arizona", "https://servicearizona.com/voterRegistration"),
    entry("AR", "Arkansas", "https://www.sos.arkansas.gov/elections/voter-information/voter-registration"),
    entry("CA", "California", "https://registertovote.ca.gov/"),
    entry("CO", "Colorado", "https://www.sos.state.co.us/pubs/elections/vote/VoterHome.html"),
    entry("CT", "Connecticut", "https://voterregistration.ct.gov/"),
    entry("DE", "Delaware", "https://ivote.de.gov/VoterView"),
    entry("DC", "District of Columbia", "https://www.dcboe.org/Voters/Register-To-Vote"),
    entry("FL", "Florida", "https://registertovote.fl.gov/"),
    entry("GA", "Georgia", "https://registertovote.sos.ga.gov/"),
    entry("HI", "Hawaii", "https://olvr.hawaii.gov/"),
    entry("ID", "Idaho", "https://voteidaho.gov/"),
    entry("IL", "Illinois", "https://ova.elections.il.gov/"),
    entry("IN", "Indiana", "https://indianavoters.in.gov/"),
    entry("IA", "Iowa", "https://mymvd.iowadot.gov/Account/Login"),
    entry("KS", "Kansas", "https://www.kdor.ks.gov/Apps/VoterReg/Default.aspx"),
    entry("KY", "Kentucky", "https://vrsws.sos.ky.gov/ovrweb/"),
    entry("LA", "Louisiana", "https://voterportal.sos.la.gov/"),
    entry("ME", "Maine", "https://www1.maine.gov/online/ovr/"),
    entry("MD", "Maryland", "https://voterservices.elections.maryland.gov/OnlineVoterRegistration/"),
    entry("MA", "Massachusetts", "https://www.sec.state.ma.us/ovr/"),
    entry("MI", "Michigan", "https://mvic.sos.state.mi.us/"),
    entry("MN", "Minnesota", "https://mnvotes.sos.state.mn.us/VoterRegistration/VoterRegistrationMain"),
    entry("MS", "Mississippi", "https://www.sos.ms.gov/elections-voting/voter-registration-information"),
    entry("MO", "Missouri", "https://s1.sos.mo.gov/elections/voterregistration/"),
    entry("MT", "Montana", "https://app.mt.gov/voterinfo/"),
    entry("NE", "Nebraska", "https://www.nebraska.gov/apps-sos-voter-registration/"),
    entry("NV", "Nevada", "https://www.nvsos.gov/sos/elections/voters/registering-to-vote"),
    entry("NH", "New Hampshire", "https://app.sos.nh.gov/Public/PartyInfo.aspx"),
    entry("NJ", "New Jersey", "https://voter.svrs.nj.gov/register"),
    entry("NM", "New Mexico", "https://portal.sos.state.nm.us/OVR/WebPages/InstructionsStep1.aspx"),
    entry("NY", "New York", "https://dmv.ny.gov/more-info/electronic-voter-registration-application"),
    entry("NC", "North Carolina", "https://www.ncsbe.gov/registering/how-register"),
    entry("ND", "North Dakota", "https://vip.sos.nd.gov/PortalListDetails.aspx?ptlhPKID=74&ptlPKID=7"),
    entry("OH", "Ohio", "https://olvr.ohiosos.gov/"),
    entry("OK", "Oklahoma", "https://okvoterportal.okelections.us/"),
    entry("OR", "Oregon", "https://sos.oregon.gov/voting/Pages/registration.aspx"),
    entry("PA", "Pennsylvania", "https://www.pavoterservices.pa.gov/Pages/VoterRegistrationApplication.aspx"),
    entry("RI", "Rhode Island", "https://vote.sos.ri.gov/"),
    entry("SC", "South Carolina", "https://info.scvotes.sc.gov/eng/voterinquiry/VoterInformationRequest.aspx"),
    entry("SD", "South Dakota", "https://sdsos.gov/elections-voting/voting/register-to-vote.aspx"),
    entry("TN", "Tennessee", "https://ovr.govote.tn.gov/"),
    entry("TX", "Texas", "https://www.votetexas.gov/register-to-vote/"),
    entry("UT", "Utah", "https://secure.utah.gov/voterreg/"),
    entry("VT", "Vermont", "https://olvr.vermont.gov/"),
    entry("VA", "Virginia", "https://www.elections.virginia.gov/citizen-portal/"),
    entry("WA", "Washington", "https://voter.votewa.gov/"),
    entry("WV", "West Virginia", "https://ovr.sos.wv.gov/Register/Landing"),
    entry("WI", "Wisconsin", "https://myvote.wi.gov/"),
    entry("WY", "Wyoming", "https://sos.wyo.gov/Elections/State/RegisteringToVote.aspx"),
];

/// Bidirectional name/code lookup over every known jurisdiction.
///
/// Built once at start-up and shared by reference. Name lookups are
/// case-insensitive; code lookups are exact. A miss is `None`, which callers
/// treat as skip-with-warning since upstream names are free text.
#[derive(Debug, Clone)]
pub struct JurisdictionRegistry {
    entries: &'static [JurisdictionEntry],
}

impl Default for JurisdictionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JurisdictionRegistry {
    pub fn new() -> Self {
        Self {
            entries: &JURISDICTIONS,
        }
    }

    pub fn code_for_name(&self, name: &str) -> Option<&'static str> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.code)
    }

    pub fn name_for_code(&self, code: &str) -> Option<&'static str> {
        self.lookup(code).map(|e| e.name)
    }

    pub fn default_registration_website(&self, code: &str) -> Option<&'static str> {
        self.lookup(code).map(|e| e.default_registration_website)
    }

    pub fn lookup(&self, code: &str) -> Option<&JurisdictionEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.lookup(code).is_some()
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.code)
    }

    pub fn entries(&self) -> &[JurisdictionEntry] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a name as typed into a spreadsheet cell.
    ///
    /// Sheet cells carry footnote asterisks, trailing notes on later lines and
    /// variants like "DC (Washington)". Only the first line is considered.
    pub fn code_for_source_name(&self, raw: &str) -> Option<&'static str> {
        let first_line = raw.lines().next().unwrap_or("").replace('*', "");
        let cleaned = first_line.trim();

        if cleaned.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("DC")) {
            return Some("DC");
        }

        let code = self.code_for_name(cleaned);
        if code.is_none() {
            debug!(raw = %raw, cleaned = %cleaned, "no jurisdiction matches source name");
        }
        code
    }
}
