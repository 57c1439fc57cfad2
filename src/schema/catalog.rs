//! Static field dictionaries for every upstream endpoint.
//!
//! Codes such as `COL_1` are reused by several endpoints with unrelated
//! meanings, so each endpoint carries its own dictionary.

/// One upstream endpoint and its field dictionary.
#[derive(Debug, Clone, Copy)]
pub struct EndpointSpec {
    /// Upstream `apiType` code.
    pub code: &'static str,
    /// Display name of the endpoint.
    pub name: &'static str,
    /// Endpoint-specific `(field code, label)` pairs.
    pub fields: &'static [(&'static str, &'static str)],
}

/// Identity and disclosure fields present on every endpoint's rows.
pub const SHARED_FIELDS: &[(&str, &str)] = &[
    ("ATPT_OFCDC_ORG_NM", "시도교육청"),
    ("ATPT_OFCDC_ORG_CODE", "시도교육청코드"),
    ("JU_ORG_NM", "교육지원청"),
    ("JU_ORG_CODE", "교육지원청코드"),
    ("ADRCD_NM", "지역"),
    ("ADRCD_CD", "지역코드"),
    ("LCTN_SC_CODE", "소재지구분코드"),
    ("SCHUL_CODE", "정보공시 학교코드"),
    ("SCHUL_NM", "학교명"),
    ("SCHUL_KND_SC_CODE", "학교급코드"),
    ("FOND_SC_CODE", "설립구분"),
    ("PBAN_EXCP_YN", "제외여부"),
    ("PBAN_EXCP_RSN", "제외사유"),
];

const SCHOOL_BASICS: &[(&str, &str)] = &[
    ("HS_KND_SC_NM", "학교특성"),
    ("BNHH_YN", "분교여부"),
    ("SCHUL_FOND_TYP_CODE", "설립유형"),
    ("DGHT_SC_CODE", "주야구분"),
    ("FOAS_MEMRD", "개교기념일"),
    ("FOND_YMD", "설립일"),
    ("ADRCD_ID", "법정동코드"),
    ("ADRES_BRKDN", "주소내역"),
    ("DTLAD_BRKDN", "상세주소내역"),
    ("ZIP_CODE", "우편번호"),
    ("SCHUL_RDNZC", "학교도로명 우편번호"),
    ("SCHUL_RDNMA", "학교도로명 주소"),
    ("SCHUL_RDNDA", "학교도로명 상세주소"),
    ("LTTUD", "위도"),
    ("LGTUD", "경도"),
    ("USER_TELNO", "전화번호"),
    ("USER_TELNO_SW", "전화번호(교무실)"),
    ("USER_TELNO_GA", "전화번호(행정실)"),
    ("PERC_FAXNO", "팩스번호"),
    ("HMPG_ADRES", "홈페이지 주소"),
    ("COEDU_SC_CODE", "남녀공학 구분"),
    ("ABSCH_YN", "폐교여부"),
    ("ABSCH_YMD", "폐교일자"),
    ("CLOSE_YN", "휴교여부"),
    ("SCHUL_CRSE_SC_VALUE", "학교과정구분값(2-3-4)"),
    ("SCHUL_CRSE_SC_VALUE_NM", "학교과정구분명(초-중-고)"),
];

const CLASS_DAYS_AND_HOURS: &[(&str, &str)] = &[
    ("COL_1", "1학년"),
    ("COL_2", "2학년"),
    ("COL_3", "3학년"),
    ("COL_4", "4학년"),
    ("COL_5", "5학년"),
    ("COL_6", "6학년"),
    ("PER_STUDAY_DAY", "주당평균수업시수(교사 1인당)"),
    ("WEEK_TOT_ITRT_HR_FGR", "주당수업시수"),
    ("ITRT_TCR_TOT_FGR", "수업교원수"),
    ("SCHUL_CRSE_SC_CODE_P", "학교과정구분(초등)"),
    ("COL_1_P", "1학년(초등)"),
    ("COL_2_P", "2학년(초등)"),
    ("COL_3_P", "3학년(초등)"),
    ("COL_4_P", "4학년(초등)"),
    ("COL_5_P", "5학년(초등)"),
    ("COL_6_P", "6학년(초등)"),
    ("SCHUL_CRSE_SC_CODE_M", "학교과정구분(중등)"),
    ("COL_1_M", "1학년(중등)"),
    ("COL_2_M", "2학년(중등)"),
    ("COL_3_M", "3학년(중등)"),
    ("SCHUL_CRSE_SC_CODE_H", "학교과정구분(고등)"),
    ("COL_1_H", "1학년(고등)"),
    ("COL_2_H", "2학년(고등)"),
    ("COL_3_H", "3학년(고등)"),
];

const FREE_SEMESTER: &[(&str, &str)] = &[
    ("SCHUL_CRSE_SC_CODE", "학교과정구분코드"),
    ("FREE_SEM_DGST", "자유학기 요약"),
    ("FREE_SEM_DETAIL", "자유학기 상세내용"),
];

const SCHOOL_OVERVIEW: &[(&str, &str)] = &[
    ("COL_1", "1학년"),
    ("COL_2", "2학년"),
    ("COL_3", "3학년"),
    ("COL_4", "4학년"),
    ("COL_5", "5학년"),
    ("COL_6", "6학년"),
    ("COL_7", "7학년"),
    ("COL_8", "8학년"),
    ("COL_SUM", "학년별 합계"),
    ("COL_FGR_SUM", "전체 합계"),
    ("AVG_FGR_SUM", "평균"),
    ("SP_SUM", "특수학급 합계"),
    ("SP_FGR_SUM", "특수학급 전체 합계"),
];

const STUDENTS_BY_SEX: &[(&str, &str)] = &[
    ("COL_M1", "1학년 남학생수"),
    ("COL_M2", "2학년 남학생수"),
    ("COL_M3", "3학년 남학생수"),
    ("COL_M4", "4학년 남학생수"),
    ("COL_M5", "5학년 남학생수"),
    ("COL_M6", "6학년 남학생수"),
    ("COL_M7", "7학년 남학생수"),
    ("COL_M8", "8학년 남학생수"),
    ("COL_MSUM", "남학생 총계"),
    ("COL_W1", "1학년 여학생수"),
    ("COL_W2", "2학년 여학생수"),
    ("COL_W3", "3학년 여학생수"),
    ("COL_W4", "4학년 여학생수"),
    ("COL_W5", "5학년 여학생수"),
    ("COL_W6", "6학년 여학생수"),
    ("COL_W7", "7학년 여학생수"),
    ("COL_W8", "8학년 여학생수"),
    ("COL_WSUM", "여학생 총계"),
    ("SUM", "전체 학생수"),
];

const STUDENTS_BY_GRADE_AND_CLASS: &[(&str, &str)] = &[
    ("COL_1", "1학년 학생수"),
    ("COL_2", "2학년 학생수"),
    ("COL_3", "3학년 학생수"),
    ("COL_4", "4학년 학생수"),
    ("COL_5", "5학년 학생수"),
    ("COL_6", "6학년 학생수"),
    ("COL_7", "7학년 학생수"),
    ("COL_8", "8학년 학생수"),
    ("COL_SUM", "전체 학생수"),
    ("COL_C1", "1학년 학급수"),
    ("COL_C2", "2학년 학급수"),
    ("COL_C3", "3학년 학급수"),
    ("COL_C4", "4학년 학급수"),
    ("COL_C5", "5학년 학급수"),
    ("COL_C6", "6학년 학급수"),
    ("COL_C7", "7학년 학급수"),
    ("COL_C8", "8학년 학급수"),
    ("COL_C_SUM", "전체 학급수"),
    ("TEACH_CNT", "교원수"),
    ("TEACH_CAL", "교원 1인당 학생수"),
];

const TRANSFERS_AND_DROPOUTS: &[(&str, &str)] = &[
    ("COL_211", "초등부1학년 전입학생수"),
    ("COL_212", "초등부1학년 전출학생수"),
    ("COL_221", "초등부2학년 전입학생수"),
    ("COL_222", "초등부2학년 전출학생수"),
    ("COL_231", "초등부3학년 전입학생수"),
    ("COL_232", "초등부3학년 전출학생수"),
    ("COL_241", "초등부4학년 전입학생수"),
    ("COL_242", "초등부4학년 전출학생수"),
    ("COL_251", "초등부5학년 전입학생수"),
    ("COL_252", "초등부5학년 전출학생수"),
    ("COL_261", "초등부6학년 전입학생수"),
    ("COL_262", "초등부6학년 전출학생수"),
    ("MVIN_SUM", "전입학생수(계)"),
    ("MVT_SUM", "전출학생수(계)"),
    ("STDNT_SUM", "전체학생수(계)"),
];

const TEACHERS_BY_POSITION: &[(&str, &str)] = &[
    ("COL_1", "교장"),
    ("COL_2", "교감"),
    ("COL_3", "수석교사"),
    ("COL_4", "보직교사"),
    ("COL_5", "교사"),
    ("COL_6", "특수교사"),
    ("COL_7", "전문상담교사"),
    ("COL_8", "사서교사"),
    ("COL_9", "실기교사"),
    ("COL_10", "보건교사"),
    ("COL_11", "영양교사"),
    ("COL_13", "기간제교사"),
    ("COL_14", "강사"),
    ("COL_15", "기타"),
];

const TEACHERS_BY_CERTIFICATE: &[(&str, &str)] = &[
    ("COL_1", "정교사(1급)"),
    ("COL_2", "정교사(2급)"),
    ("COL_3", "준교사"),
    ("COL_4", "전문상담교사(1급)"),
    ("COL_5", "전문상담교사(2급)"),
    ("COL_6", "사서교사(1급)"),
    ("COL_7", "사서교사(2급)"),
    ("COL_8", "실기교사"),
    ("COL_9", "보건교사(1급)"),
    ("COL_10", "보건교사(2급)"),
    ("COL_11", "영양교사(1급)"),
    ("COL_19", "영양교사(2급)"),
    ("COL_20", "특수학교(1급)"),
    ("COL_21", "특수학교(2급)"),
];

const VIOLENCE_PREVENTION: &[(&str, &str)] = &[
    ("SEM_SC_CODE", "학기구분코드"),
    ("SEM_SC_NM", "학기구분명"),
    ("TOT_AVG_TM", "총 평균시간"),
    ("FRL_CURR_ITRT_TM", "정규교과 시간"),
    ("NN_FRL_CURR_ITRT_TM", "비정규교과 시간"),
    ("PTPT_NMPR_FGR1", "1학기 참여인원"),
    ("PTPT_NMPR_FGR2", "2학기 참여인원"),
    ("PTPT_NMPR_PER1", "1학기 참여율"),
    ("PTPT_NMPR_PER2", "2학기 참여율"),
];

const NEW_ENTRANTS: &[(&str, &str)] = &[
    ("BEAGE_BOY_FGR", "적정연령 남학생수"),
    ("BEAGE_GIR_FGR", "적정연령 여학생수"),
    ("ELPD_ETRC_BOY_FGR", "조기입학 남학생수"),
    ("ELPD_ETRC_GIR_FGR", "조기입학 여학생수"),
    ("HEST_AWA_LTAGE_BOY_FGR", "취학유예 남학생수"),
    ("HEST_AWA_LTAGE_GIR_FGR", "취학유예 여학생수"),
    ("TOT_SUM", "전체 합계"),
    ("TOTAL_1", "1학기 전체"),
    ("TOTAL_2", "2학기 전체"),
];

/// Every endpoint the upstream service exposes, in menu order.
pub const ENDPOINTS: &[EndpointSpec] = &[
    EndpointSpec {
        code: "0",
        name: "학교기본정보",
        fields: SCHOOL_BASICS,
    },
    EndpointSpec {
        code: "08",
        name: "수업일수 및 수업시수 현황",
        fields: CLASS_DAYS_AND_HOURS,
    },
    EndpointSpec {
        code: "04",
        name: "자유학기제 운영",
        fields: FREE_SEMESTER,
    },
    EndpointSpec {
        code: "62",
        name: "학교 현황",
        fields: SCHOOL_OVERVIEW,
    },
    EndpointSpec {
        code: "63",
        name: "성별 학생수",
        fields: STUDENTS_BY_SEX,
    },
    EndpointSpec {
        code: "09",
        name: "학년별·학급별 학생수",
        fields: STUDENTS_BY_GRADE_AND_CLASS,
    },
    EndpointSpec {
        code: "10",
        name: "전·출입 및 학업중단 학생 수",
        fields: TRANSFERS_AND_DROPOUTS,
    },
    EndpointSpec {
        code: "22",
        name: "직위별 교원 현황",
        fields: TEACHERS_BY_POSITION,
    },
    EndpointSpec {
        code: "64",
        name: "자격종별 교원 현황",
        fields: TEACHERS_BY_CERTIFICATE,
    },
    // No published dictionary beyond the shared fields.
    EndpointSpec {
        code: "24",
        name: "표시과목별 교원 현황",
        fields: &[],
    },
    EndpointSpec {
        code: "94",
        name: "학교폭력 예방교육 실적",
        fields: VIOLENCE_PREVENTION,
    },
    EndpointSpec {
        code: "51",
        name: "입학생 현황",
        fields: NEW_ENTRANTS,
    },
];

/// Looks up an endpoint by its upstream code.
pub fn find_endpoint(code: &str) -> Option<&'static EndpointSpec> {
    ENDPOINTS.iter().find(|e| e.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_endpoint_codes_unique() {
        let codes: HashSet<_> = ENDPOINTS.iter().map(|e| e.code).collect();
        assert_eq!(codes.len(), ENDPOINTS.len());
    }

    #[test]
    fn test_find_endpoint() {
        assert_eq!(find_endpoint("22").map(|e| e.name), Some("직위별 교원 현황"));
        assert!(find_endpoint("99").is_none());
    }

    #[test]
    fn test_col_1_differs_between_endpoints() {
        let label = |code: &str| {
            find_endpoint(code)
                .and_then(|e| e.fields.iter().find(|(c, _)| *c == "COL_1"))
                .map(|(_, l)| *l)
        };
        assert_eq!(label("22"), Some("교장"));
        assert_eq!(label("64"), Some("정교사(1급)"));
        assert_eq!(label("09"), Some("1학년 학생수"));
    }
}
